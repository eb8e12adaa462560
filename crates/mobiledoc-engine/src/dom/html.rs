use super::document::{DomTree, NodeId, VOID_ELEMENTS};
use super::lexer::{HtmlToken, end_tag_name, lex, parse_start_tag};
use super::{ExternalTree, ExternalTreeMut};

/// Tags that implicitly close an open `p`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "p", "div", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "hr",
];

/// Parse an HTML fragment into a [`DomTree`] rooted at a `body` element.
///
/// This is a forgiving tree builder, not a conforming HTML parser. Comments
/// and declarations are dropped, void elements never take children, end
/// tags with no matching open element are ignored and anything still open
/// at the end of input is closed there.
pub fn parse_fragment(input: &str) -> DomTree {
    let mut tree = DomTree::new("body");
    let mut open: Vec<NodeId> = vec![tree.root()];

    for token in lex(input) {
        match token.kind {
            HtmlToken::Comment | HtmlToken::Declaration => {}
            HtmlToken::Text => {
                let text = html_escape::decode_html_entities(token.text);
                let parent = current(&open, &tree);
                let node = tree.create_text(&text);
                tree.append_child(parent, node);
            }
            HtmlToken::StartTag => {
                let tag = parse_start_tag(token.text);
                close_implied(&tree, &mut open, &tag.name);

                let element = tree.create_element(&tag.name);
                for (name, value) in &tag.attributes {
                    tree.set_attribute(element, name, value);
                }
                let parent = current(&open, &tree);
                tree.append_child(parent, element);

                if !VOID_ELEMENTS.contains(&tag.name.as_str()) {
                    open.push(element);
                }
            }
            HtmlToken::EndTag => {
                let name = end_tag_name(token.text);
                match open
                    .iter()
                    .rposition(|&n| n != tree.root() && tree.tag_name(n) == Some(name.as_str()))
                {
                    Some(index) => open.truncate(index),
                    None => log::debug!("ignoring unmatched end tag </{name}>"),
                }
            }
        }
    }

    tree
}

fn current(open: &[NodeId], tree: &DomTree) -> NodeId {
    open.last().copied().unwrap_or_else(|| tree.root())
}

/// Pop elements that a new `tag` start tag closes implicitly.
fn close_implied(tree: &DomTree, open: &mut Vec<NodeId>, tag: &str) {
    let closes = |name: &str| match tag {
        "li" => Some(name == "li"),
        t if CLOSES_PARAGRAPH.contains(&t) => Some(name == "p"),
        _ => None,
    };

    // Search back to the nearest boundary: a list for `li`, anything that
    // is not inline content for `p`.
    for index in (1..open.len()).rev() {
        let Some(name) = tree.tag_name(open[index]) else {
            continue;
        };
        match closes(name) {
            Some(true) => {
                open.truncate(index);
                return;
            }
            Some(false) if tag == "li" && matches!(name, "ul" | "ol") => return,
            Some(false) if tag != "li" && !is_inline(name) => return,
            Some(false) => {}
            None => return,
        }
    }
}

fn is_inline(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "b" | "i" | "em" | "strong" | "span" | "u" | "s" | "code" | "sub" | "sup" | "small"
    )
}

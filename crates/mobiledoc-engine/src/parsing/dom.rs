use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

use crate::dom::{ExternalTree, element_tag};
use crate::error::Result;
use crate::models::markup::VALID_ATTRIBUTES;
use crate::models::{Builder, ContainerKey, Markup, Post, SectionKey, SectionKind};

use super::section::SectionParser;

pub const NO_BREAK_SPACE: char = '\u{a0}';

const GOOGLE_DOCS_CONTAINER_ID_PREFIX: &str = "docs-internal-guid";

/// Knobs for importing an external tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomParserOptions {
    /// Treat the children of a Google Docs `<b id="docs-internal-guid-...">`
    /// wrapper as the top-level content.
    pub unwrap_container: bool,
    /// Merge adjacent sections with the same explicit tag, not only
    /// inferred paragraphs.
    pub merge_explicit_sections: bool,
    /// Collapse runs of ASCII whitespace in text to one space.
    pub collapse_whitespace: bool,
}

impl Default for DomParserOptions {
    fn default() -> Self {
        Self {
            unwrap_container: true,
            merge_explicit_sections: false,
            collapse_whitespace: true,
        }
    }
}

/// Builds a [`Post`] from any [`ExternalTree`].
pub struct DomParser<'b> {
    builder: &'b mut Builder,
    options: DomParserOptions,
}

impl<'b> DomParser<'b> {
    pub fn new(builder: &'b mut Builder) -> Self {
        Self::with_options(builder, DomParserOptions::default())
    }

    pub fn with_options(builder: &'b mut Builder, options: DomParserOptions) -> Self {
        Self { builder, options }
    }

    /// Parse the children of `element` into a post.
    pub fn parse<T: ExternalTree>(&mut self, tree: &T, element: T::Node) -> Result<Post> {
        let mut post = self.builder.create_post();
        let root = if self.options.unwrap_container {
            detect_root_element(tree, element)
        } else {
            element
        };

        let options = self.options;
        let mut section_parser = SectionParser::new(self.builder, options);
        for child in tree.children(root) {
            for section in section_parser.parse(tree, &mut post, root, child)? {
                append_section(&options, &mut post, section)?;
            }
        }

        log::debug!("parsed external tree into {} sections", post.sections().len());
        Ok(post)
    }
}

/// Append a freshly parsed top-level section, dropping it if blank and
/// joining it into the previous section when the two may merge.
fn append_section(options: &DomParserOptions, post: &mut Post, section: SectionKey) -> Result<()> {
    if post.is_blank(ContainerKey::Section(section))? {
        post.discard_section(section)?;
        return Ok(());
    }

    match post.sections().tail() {
        Some(last) if should_merge(options, post, last, section) => {
            post.join_sections(last, section)?;
            post.discard_section(section)?;
        }
        _ => post.append_section(section)?,
    }
    Ok(())
}

fn should_merge(options: &DomParserOptions, post: &Post, last: SectionKey, next: SectionKey) -> bool {
    let (Some(last), Some(next)) = (post.section(last), post.section(next)) else {
        return false;
    };
    match (last.kind(), next.kind()) {
        (SectionKind::Markup(a), SectionKind::Markup(b)) => {
            a.tag_name() == b.tag_name()
                && ((a.is_inferred() && b.is_inferred()) || options.merge_explicit_sections)
        }
        (SectionKind::List(a), SectionKind::List(b)) => {
            options.merge_explicit_sections && a.tag_name() == b.tag_name()
        }
        _ => false,
    }
}

/// The element whose children are the real content: a Google Docs
/// wrapper among `element`'s children if there is one.
pub fn detect_root_element<T: ExternalTree>(tree: &T, element: T::Node) -> T::Node {
    tree.children(element)
        .into_iter()
        .find(|&child| is_google_docs_container(tree, child))
        .unwrap_or(element)
}

fn is_google_docs_container<T: ExternalTree>(tree: &T, node: T::Node) -> bool {
    element_tag(tree, node).as_deref() == Some("b")
        && tree
            .attribute(node, "id")
            .is_some_and(|id| id.starts_with(GOOGLE_DOCS_CONTAINER_ID_PREFIX))
}

fn remap_tag_name(tag_name: &str) -> &str {
    match tag_name {
        "b" => "strong",
        "i" => "em",
        other => other,
    }
}

/// Markup for one element, if it is a markup source.
pub(crate) fn markup_from_node<T: ExternalTree>(
    builder: &mut Builder,
    tree: &T,
    node: T::Node,
) -> Option<Rc<Markup>> {
    let tag_name = element_tag(tree, node)?;
    if !Markup::is_valid_tag(&tag_name) {
        return None;
    }

    let attributes: Vec<(String, String)> = tree
        .attributes(node)
        .into_iter()
        .filter(|(name, _)| {
            let keep = VALID_ATTRIBUTES.contains(&name.as_str());
            if !keep {
                log::debug!("dropping attribute {name:?} on <{tag_name}>");
            }
            keep
        })
        .collect();

    match builder.create_markup(remap_tag_name(&tag_name), attributes) {
        Ok(markup) => Some(markup),
        Err(err) => {
            log::warn!("skipping markup for <{tag_name}>: {err}");
            None
        }
    }
}

/// Markups of every markup-source ancestor of `text_node` below `root`,
/// outermost first.
pub(crate) fn collect_markups<T: ExternalTree>(
    builder: &mut Builder,
    tree: &T,
    text_node: T::Node,
    root: T::Node,
) -> Vec<Rc<Markup>> {
    let mut markups = Vec::new();
    let mut current = tree.parent(text_node);
    while let Some(node) = current {
        if node == root {
            break;
        }
        if let Some(markup) = markup_from_node(builder, tree, node) {
            markups.push(markup);
        }
        current = tree.parent(node);
    }
    markups.reverse();
    markups
}

/// Undo the no-break spaces the editor renderer writes.
pub fn transform_html_text(text: &str) -> String {
    text.replace(NO_BREAK_SPACE, " ")
}

/// Text as imported: whitespace runs collapsed if asked, then no-break
/// spaces turned back into plain spaces.
pub(crate) fn normalize_imported_text(text: &str, collapse_whitespace: bool) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    if collapse_whitespace {
        let re = WHITESPACE.get_or_init(|| Regex::new(r"[ \t\r\n\f]+").expect("valid regex"));
        transform_html_text(&re.replace_all(text, " "))
    } else {
        transform_html_text(text)
    }
}

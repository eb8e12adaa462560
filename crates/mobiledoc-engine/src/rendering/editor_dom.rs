use std::collections::HashSet;
use std::rc::Rc;

use crate::dom::ExternalTreeMut;
use crate::error::{InvariantViolation, Result};
use crate::models::marker::common_markup_prefix;
use crate::models::{ContainerKey, Markup, Post, SectionKey, SectionKind};
use crate::parsing::dom::NO_BREAK_SPACE;

use super::render_tree::{PostNodeRef, RenderKey, RenderTree};

/// Attribute naming the card a placeholder element stands for.
pub const CARD_ATTRIBUTE: &str = "data-card";

/// Materialises a post into an external tree and keeps it in step.
///
/// Each pass first applies the removals queued by reconciliation, then
/// renders sections with no render node yet and re-renders dirty ones.
/// Clean sections are left alone.
#[derive(Debug, Default)]
pub struct EditorDomRenderer;

impl EditorDomRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render<T: ExternalTreeMut>(
        &self,
        post: &mut Post,
        render_tree: &mut RenderTree<T::Node>,
        tree: &mut T,
    ) -> Result<()> {
        let removed = apply_removals(post, render_tree, tree)?
            + reap_unlinked_sections(post, render_tree, tree)?;

        let root = render_tree.root();
        let root_element = render_tree
            .node(root)
            .and_then(|node| node.element())
            .ok_or(InvariantViolation::UnknownRenderNode)?;

        let mut previous: Option<RenderKey> = None;
        let mut rendered = 0;
        for section in post.section_keys() {
            let key = match render_tree.render_node_for(PostNodeRef::Section(section)) {
                Some(key) => key,
                None => {
                    let key = render_tree.build_render_node(PostNodeRef::Section(section));
                    render_tree.insert_child_after(root, key, previous)?;
                    key
                }
            };

            let needs_render = render_tree
                .node(key)
                .is_some_and(|node| node.is_dirty() || node.element().is_none());
            if needs_render {
                let after = previous.and_then(|p| render_tree.node(p)).and_then(|n| n.element());
                render_section(post, render_tree, tree, section, key, root_element, after)?;
                rendered += 1;
            }
            previous = Some(key);
        }
        render_tree.mark_clean(root);

        log::debug!("editor render: {rendered} sections rendered, {removed} nodes removed");
        Ok(())
    }
}

/// Detach and drop everything queued for removal, model nodes included.
fn apply_removals<T: ExternalTreeMut>(
    post: &mut Post,
    render_tree: &mut RenderTree<T::Node>,
    tree: &mut T,
) -> Result<usize> {
    let pending = render_tree.take_pending_removals();
    let mut removed = 0;
    for key in pending {
        let Some(post_node) = render_tree.node(key).map(|node| node.post_node()) else {
            continue;
        };
        match post_node {
            PostNodeRef::Marker(marker) if post.marker(marker).is_some() => {
                post.discard_marker(marker)?;
            }
            PostNodeRef::ListItem(item) if post.list_item(item).is_some() => {
                post.discard_list_item(item)?;
            }
            PostNodeRef::Section(section) if post.section(section).is_some() => {
                post.discard_section(section)?;
            }
            _ => {}
        }
        if let Some(element) = render_tree.remove_render_node(key)? {
            tree.detach(element);
        }
        removed += 1;
    }
    Ok(removed)
}

/// Drop the render nodes of sections that are no longer in the post.
///
/// The sections themselves stay in the arena; only their elements go.
fn reap_unlinked_sections<T: ExternalTreeMut>(
    post: &Post,
    render_tree: &mut RenderTree<T::Node>,
    tree: &mut T,
) -> Result<usize> {
    let linked: HashSet<SectionKey> = post.section_keys().into_iter().collect();
    let mut reaped = 0;
    for key in render_tree.children(render_tree.root()) {
        let Some(PostNodeRef::Section(section)) = render_tree.node(key).map(|n| n.post_node()) else {
            continue;
        };
        if linked.contains(&section) {
            continue;
        }
        log::trace!("section {section:?} left the post, dropping its element");
        if let Some(element) = render_tree.remove_render_node(key)? {
            tree.detach(element);
        }
        reaped += 1;
    }
    Ok(reaped)
}

/// Build the element for one section and swap it in for any previous one.
fn render_section<T: ExternalTreeMut>(
    post: &Post,
    render_tree: &mut RenderTree<T::Node>,
    tree: &mut T,
    section: SectionKey,
    key: RenderKey,
    root_element: T::Node,
    after: Option<T::Node>,
) -> Result<()> {
    for child in render_tree.children(key) {
        render_tree.remove_render_node(child)?;
    }

    let kind = post
        .section(section)
        .ok_or(InvariantViolation::UnknownItem)?
        .kind();
    let element = match kind {
        SectionKind::Markup(markup) => {
            let element = tree.create_element(markup.tag_name());
            render_markers(post, render_tree, tree, ContainerKey::Section(section), key, element)?;
            element
        }
        SectionKind::List(list) => {
            let element = tree.create_element(list.tag_name());
            for item in post.list_items(section)? {
                let item_key = render_tree.build_render_node(PostNodeRef::ListItem(item));
                render_tree.append_child(key, item_key)?;
                let li = tree.create_element("li");
                tree.append_child(element, li);
                render_tree.bind_element(item_key, li)?;
                render_markers(post, render_tree, tree, ContainerKey::ListItem(item), item_key, li)?;
                render_tree.mark_clean(item_key);
            }
            element
        }
        SectionKind::Image(image) => {
            let element = tree.create_element("img");
            if let Some(src) = image.src() {
                tree.set_attribute(element, "src", src);
            }
            element
        }
        SectionKind::Card(card) => {
            let element = tree.create_element("div");
            tree.set_attribute(element, CARD_ATTRIBUTE, card.name());
            element
        }
    };

    let stale = render_tree.node(key).and_then(|node| node.element());
    let reference = match stale {
        Some(stale) => Some(stale),
        None => next_sibling(tree, root_element, after),
    };
    tree.insert_before(root_element, element, reference);
    if let Some(stale) = stale {
        tree.detach(stale);
    }
    render_tree.bind_element(key, element)?;
    render_tree.mark_clean(key);
    Ok(())
}

/// One text node per marker, wrapped in markup elements nested the way the
/// stack encoding describes.
fn render_markers<T: ExternalTreeMut>(
    post: &Post,
    render_tree: &mut RenderTree<T::Node>,
    tree: &mut T,
    container: ContainerKey,
    parent_key: RenderKey,
    element: T::Node,
) -> Result<()> {
    let mut open: Vec<(Rc<Markup>, T::Node)> = Vec::new();
    for marker_key in post.markers(container)? {
        let marker = post
            .marker(marker_key)
            .ok_or(InvariantViolation::UnknownItem)?;

        let open_markups: Vec<Rc<Markup>> = open.iter().map(|(m, _)| Rc::clone(m)).collect();
        open.truncate(common_markup_prefix(&open_markups, marker.markups()));
        for markup in &marker.markups()[open.len()..] {
            let markup_element = tree.create_element(markup.tag_name());
            for (name, value) in markup.attributes() {
                tree.set_attribute(markup_element, name, value);
            }
            let parent = open.last().map_or(element, |(_, node)| *node);
            tree.append_child(parent, markup_element);
            open.push((Rc::clone(markup), markup_element));
        }

        let text = tree.create_text(&editor_text(marker.value()));
        let parent = open.last().map_or(element, |(_, node)| *node);
        tree.append_child(parent, text);

        let key = render_tree.build_render_node(PostNodeRef::Marker(marker_key));
        render_tree.append_child(parent_key, key)?;
        render_tree.bind_element(key, text)?;
        render_tree.mark_clean(key);
    }
    Ok(())
}

/// Marker text as the editor shows it: spaces become no-break spaces so the
/// host does not collapse them.
pub fn editor_text(value: &str) -> String {
    value.replace(' ', &NO_BREAK_SPACE.to_string())
}

fn next_sibling<T: ExternalTreeMut>(tree: &T, parent: T::Node, after: Option<T::Node>) -> Option<T::Node> {
    let children = tree.children(parent);
    match after {
        Some(after) => children
            .iter()
            .position(|&child| child == after)
            .and_then(|index| children.get(index + 1).copied()),
        None => children.first().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomTree, ExternalTree};
    use crate::models::Builder;
    use crate::parsing::MobiledocParser;
    use pretty_assertions::assert_eq;

    fn render(json: &str) -> (Post, RenderTree<crate::dom::NodeId>, DomTree) {
        let mut builder = Builder::new();
        let mut post = MobiledocParser::new(&mut builder).parse_json(json).unwrap();
        let mut tree = DomTree::new("div");
        let mut render_tree = RenderTree::new(tree.root());
        EditorDomRenderer::new()
            .render(&mut post, &mut render_tree, &mut tree)
            .unwrap();
        (post, render_tree, tree)
    }

    #[test]
    fn nests_markup_elements_by_shared_prefix() {
        let (_, _, tree) = render(
            r#"{"version":"0.1","sections":[[["b",[]],["i",[]]],[[1,"p",[[[0],0,"a "],[[1],1,"b"],[[],1,"c"],[[],0,"d"]]]]]}"#,
        );
        assert_eq!(
            tree.inner_html(tree.root()),
            "<p><b>a\u{a0}<i>b</i>c</b>d</p>"
        );
    }

    #[test]
    fn renders_every_section_kind() {
        let (_, _, tree) = render(
            r#"{"version":"0.1","sections":[[["a",["href","http://x.com"]]],[
                [1,"h2",[[[],0,"T"]]],
                [3,"ol",[[[[0],1,"one"]],[[[],0,"two"]]]],
                [2,"/a.png"],
                [10,"embed",{}]
            ]]}"#,
        );
        assert_eq!(
            tree.inner_html(tree.root()),
            concat!(
                "<h2>T</h2>",
                "<ol><li><a href=\"http://x.com\">one</a></li><li>two</li></ol>",
                "<img src=\"/a.png\">",
                "<div data-card=\"embed\"></div>",
            )
        );
    }

    #[test]
    fn every_marker_is_bound_and_clean() {
        let (post, render_tree, tree) =
            render(r#"{"version":"0.1","sections":[[],[[1,"p",[[[],0,"x"],[[],0,"y"]]]]]}"#);
        let section = post.sections().head().unwrap();
        let section_key = render_tree
            .render_node_for(PostNodeRef::Section(section))
            .unwrap();
        let children = render_tree.children(section_key);
        assert_eq!(children.len(), 2);

        for (child, marker) in children
            .iter()
            .zip(post.markers(ContainerKey::Section(section)).unwrap())
        {
            let node = render_tree.node(*child).unwrap();
            assert_eq!(node.post_node(), PostNodeRef::Marker(marker));
            assert!(!node.is_dirty());
            let text = node.element().unwrap();
            assert_eq!(tree.text(text), Some(post.marker(marker).unwrap().value()));
        }
    }

    #[test]
    fn clean_sections_are_not_rerendered() {
        let (mut post, mut render_tree, mut tree) =
            render(r#"{"version":"0.1","sections":[[],[[1,"p",[[[],0,"x"]]]]]}"#);
        let p = tree.children(tree.root())[0];

        EditorDomRenderer::new()
            .render(&mut post, &mut render_tree, &mut tree)
            .unwrap();

        assert_eq!(tree.children(tree.root()), vec![p]);
    }

    #[test]
    fn dirty_sections_are_replaced_in_place() {
        let (mut post, mut render_tree, mut tree) = render(
            r#"{"version":"0.1","sections":[[],[[1,"p",[[[],0,"x"]]],[1,"h1",[[[],0,"y"]]]]]}"#,
        );
        let first = post.sections().head().unwrap();
        let marker = post.markers(ContainerKey::Section(first)).unwrap()[0];
        post.marker_mut(marker).unwrap().set_value("changed");
        let key = render_tree
            .render_node_for(PostNodeRef::Section(first))
            .unwrap();
        render_tree.mark_dirty(key);

        EditorDomRenderer::new()
            .render(&mut post, &mut render_tree, &mut tree)
            .unwrap();

        assert_eq!(tree.inner_html(tree.root()), "<p>changed</p><h1>y</h1>");
        assert_eq!(render_tree.children(key).len(), 1);
    }

    #[test]
    fn new_sections_land_in_document_order() {
        let (mut post, mut render_tree, mut tree) = render(
            r#"{"version":"0.1","sections":[[],[[1,"p",[[[],0,"a"]]],[1,"p",[[[],0,"c"]]]]]}"#,
        );
        let builder = Builder::new();
        let section = builder.create_markup_section(&mut post, Some("h2")).unwrap();
        let marker = builder.create_marker(&mut post, "b", vec![]);
        post.append_marker(ContainerKey::Section(section), marker).unwrap();
        let first = post.sections().head();
        post.insert_section_after(section, first).unwrap();

        EditorDomRenderer::new()
            .render(&mut post, &mut render_tree, &mut tree)
            .unwrap();

        assert_eq!(tree.inner_html(tree.root()), "<p>a</p><h2>b</h2><p>c</p>");
    }

    #[test]
    fn sections_unlinked_from_the_post_lose_their_elements() {
        let (mut post, mut render_tree, mut tree) =
            render(r#"{"version":"0.1","sections":[[],[[1,"p",[[[],0,"a"]]],[1,"h2",[[[],0,"b"]]]]]}"#);
        let first = post.section_keys()[0];
        let marker = post.markers(ContainerKey::Section(first)).unwrap()[0];

        post.remove_section(first).unwrap();
        EditorDomRenderer::new()
            .render(&mut post, &mut render_tree, &mut tree)
            .unwrap();

        assert_eq!(tree.inner_html(tree.root()), "<h2>b</h2>");
        assert_eq!(render_tree.render_node_for(PostNodeRef::Section(first)), None);
        assert_eq!(render_tree.render_node_for(PostNodeRef::Marker(marker)), None);
        assert!(post.section(first).is_some());

        post.prepend_section(first).unwrap();
        EditorDomRenderer::new()
            .render(&mut post, &mut render_tree, &mut tree)
            .unwrap();

        assert_eq!(tree.inner_html(tree.root()), "<p>a</p><h2>b</h2>");
    }

    #[test]
    fn spaces_become_no_break_spaces() {
        assert_eq!(editor_text("a b  c"), "a\u{a0}b\u{a0}\u{a0}c");
    }
}

//! # External Trees
//!
//! The engine never owns the presentation surface it imports from and
//! reconciles against. It reads it through [`ExternalTree`] and, when
//! rendering, writes it through [`ExternalTreeMut`]. Node handles must be
//! cheap, copyable and stable for as long as the node exists, since the
//! render tree keys its bindings on them.
//!
//! [`DomTree`] is the in-crate implementation: an arena-backed element
//! tree that the HTML fragment parser in [`html`] produces and that the
//! editor renderer can target.

pub mod document;
pub mod html;
pub mod lexer;

use std::fmt::Debug;
use std::hash::Hash;

pub use document::{DomTree, NodeId};
pub use html::parse_fragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// Read access to a host tree.
pub trait ExternalTree {
    type Node: Copy + Eq + Hash + Debug;

    fn node_kind(&self, node: Self::Node) -> NodeKind;

    /// Tag name of an element, `None` for text.
    fn tag_name(&self, node: Self::Node) -> Option<&str>;

    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// All attributes of an element in document order.
    fn attributes(&self, node: Self::Node) -> Vec<(String, String)>;

    /// Content of a text node, `None` for elements.
    fn text(&self, node: Self::Node) -> Option<&str>;

    fn is_text(&self, node: Self::Node) -> bool {
        self.node_kind(node) == NodeKind::Text
    }
}

/// Write access to a host tree, used by the editor renderer.
pub trait ExternalTreeMut: ExternalTree {
    fn create_element(&mut self, tag_name: &str) -> Self::Node;

    fn create_text(&mut self, text: &str) -> Self::Node;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    fn set_text(&mut self, node: Self::Node, text: &str);

    /// Move `node` under `parent`, before `reference` or last when `None`.
    fn insert_before(&mut self, parent: Self::Node, node: Self::Node, reference: Option<Self::Node>);

    /// Detach `node` (and its subtree) from its parent.
    fn detach(&mut self, node: Self::Node);

    fn append_child(&mut self, parent: Self::Node, node: Self::Node) {
        self.insert_before(parent, node, None);
    }
}

/// Text nodes under `root` in document order.
pub fn walk_text_nodes<T: ExternalTree>(tree: &T, root: T::Node) -> Vec<T::Node> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if tree.is_text(node) {
            out.push(node);
        } else {
            stack.extend(tree.children(node).into_iter().rev());
        }
    }
    out
}

/// Concatenated text of every text node under `root`.
pub fn text_content<T: ExternalTree>(tree: &T, root: T::Node) -> String {
    walk_text_nodes(tree, root)
        .into_iter()
        .filter_map(|n| tree.text(n))
        .collect()
}

/// Lower-cased tag name of an element.
pub(crate) fn element_tag<T: ExternalTree>(tree: &T, node: T::Node) -> Option<String> {
    tree.tag_name(node).map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn walks_text_in_document_order() {
        let tree = parse_fragment("<p>a<b>b<i>c</i></b>d</p><p>e</p>");
        let texts: Vec<_> = walk_text_nodes(&tree, tree.root())
            .into_iter()
            .filter_map(|n| tree.text(n))
            .collect();

        assert_eq!(texts, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(text_content(&tree, tree.root()), "abcde");
    }

    #[test]
    fn walking_a_text_node_yields_itself() {
        let tree = parse_fragment("plain");
        let text = tree.children(tree.root())[0];
        assert_eq!(walk_text_nodes(&tree, text), vec![text]);
    }
}

use indexmap::IndexMap;
use slotmap::SlotMap;

use super::{ExternalTree, ExternalTreeMut, NodeKind};

slotmap::new_key_type! {
    pub struct NodeId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeData {
    Element {
        tag_name: String,
        attributes: IndexMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct DomNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Elements whose serialisation has no closing tag.
pub const VOID_ELEMENTS: &[&str] = &["br", "img", "hr", "input", "meta", "link"];

/// A small element tree with stable node ids.
///
/// Detached nodes stay in the arena until the tree is dropped, so ids held
/// elsewhere never dangle into a different node.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: SlotMap<NodeId, DomNode>,
    root: NodeId,
}

impl DomTree {
    /// An empty tree whose root element has the given tag.
    pub fn new(root_tag: &str) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(DomNode {
            data: NodeData::Element {
                tag_name: root_tag.to_ascii_lowercase(),
                attributes: IndexMap::new(),
            },
            parent: None,
            children: Vec::new(),
        });
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// First element with `tag_name` under `from`, depth first.
    pub fn find_element(&self, from: NodeId, tag_name: &str) -> Option<NodeId> {
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if self
                .tag_name(node)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag_name))
            {
                return Some(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        None
    }

    /// Serialise `node` and its subtree.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serialise the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(dom_node) = self.nodes.get(node) else {
            return;
        };
        match &dom_node.data {
            NodeData::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeData::Element {
                tag_name,
                attributes,
            } => {
                out.push('<');
                out.push_str(tag_name);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag_name.as_str()) {
                    return;
                }
                for &child in &dom_node.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag_name);
                out.push('>');
            }
        }
    }

    fn insert_node(&mut self, data: NodeData) -> NodeId {
        self.nodes.insert(DomNode {
            data,
            parent: None,
            children: Vec::new(),
        })
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }
}

impl ExternalTree for DomTree {
    type Node = NodeId;

    fn node_kind(&self, node: NodeId) -> NodeKind {
        match self.nodes.get(node).map(|n| &n.data) {
            Some(NodeData::Text(_)) => NodeKind::Text,
            _ => NodeKind::Element,
        }
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node)?.data {
            NodeData::Element { tag_name, .. } => Some(tag_name),
            NodeData::Text(_) => None,
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node)?.parent
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node)?.data {
            NodeData::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            NodeData::Text(_) => None,
        }
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        match self.nodes.get(node).map(|n| &n.data) {
            Some(NodeData::Element { attributes, .. }) => attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }
}

impl ExternalTreeMut for DomTree {
    fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.insert_node(NodeData::Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: IndexMap::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.insert_node(NodeData::Text(text.to_string()))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(NodeData::Element { attributes, .. }) =
            self.nodes.get_mut(node).map(|n| &mut n.data)
        {
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(NodeData::Text(current)) = self.nodes.get_mut(node).map(|n| &mut n.data) {
            *current = text.to_string();
        }
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        if !self.contains(parent) || !self.contains(node) || self.is_ancestor_or_self(node, parent)
        {
            log::warn!("ignoring insertion of {node:?} under {parent:?}");
            return;
        }
        self.detach(node);

        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return;
        };
        let position = reference
            .and_then(|r| parent_node.children.iter().position(|&c| c == r))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(position, node);
        if let Some(child) = self.nodes.get_mut(node) {
            child.parent = Some(parent);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&c| c != node);
        }
        if let Some(child) = self.nodes.get_mut(node) {
            child.parent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_and_serialises() {
        let mut tree = DomTree::new("div");
        let root = tree.root();
        let p = tree.create_element("P");
        let a = tree.create_element("a");
        tree.set_attribute(a, "href", "http://x.com/?a=1&b=\"2\"");
        let text = tree.create_text("1 < 2 & 3");
        tree.append_child(root, p);
        tree.append_child(p, a);
        tree.append_child(a, text);
        let br = tree.create_element("br");
        tree.append_child(p, br);

        assert_eq!(
            tree.to_html(root),
            "<div><p><a href=\"http://x.com/?a=1&amp;b=&quot;2&quot;\">1 &lt; 2 &amp; 3</a><br></p></div>"
        );
        assert_eq!(
            tree.inner_html(p),
            "<a href=\"http://x.com/?a=1&amp;b=&quot;2&quot;\">1 &lt; 2 &amp; 3</a><br>"
        );
    }

    #[test]
    fn insert_before_reorders_and_moves() {
        let mut tree = DomTree::new("div");
        let root = tree.root();
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        let c = tree.create_text("c");
        tree.append_child(root, a);
        tree.append_child(root, c);
        tree.insert_before(root, b, Some(c));
        assert_eq!(tree.inner_html(root), "abc");

        tree.insert_before(root, c, Some(a));
        assert_eq!(tree.inner_html(root), "cab");
        assert_eq!(tree.parent(c), Some(root));
    }

    #[test]
    fn detach_keeps_node_alive() {
        let mut tree = DomTree::new("div");
        let root = tree.root();
        let p = tree.create_element("p");
        tree.append_child(root, p);

        tree.detach(p);

        assert!(tree.contains(p));
        assert_eq!(tree.parent(p), None);
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn refuses_to_create_cycles() {
        let mut tree = DomTree::new("div");
        let root = tree.root();
        let p = tree.create_element("p");
        tree.append_child(root, p);

        tree.append_child(p, root);

        assert_eq!(tree.parent(root), None);
        assert!(tree.children(p).is_empty());
    }

    #[test]
    fn text_nodes_have_no_tag_or_attributes() {
        let mut tree = DomTree::new("div");
        let text = tree.create_text("x");
        tree.set_attribute(text, "href", "y");

        assert_eq!(tree.node_kind(text), NodeKind::Text);
        assert_eq!(tree.tag_name(text), None);
        assert_eq!(tree.attribute(text, "href"), None);
        assert_eq!(tree.text(text), Some("x"));
    }
}

//! # Render Tree
//!
//! A [`RenderTree`] mirrors the rendered part of a post. Each
//! [`RenderNode`] binds one model node ([`PostNodeRef`]) to at most one
//! external node and carries a [`RenderState`]. Both directions of the
//! binding are kept in explicit maps, filled when a node is built or bound
//! and cleared when it is removed. Nothing is ever looked up by tree
//! position.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use slotmap::SlotMap;

use crate::error::InvariantViolation;
use crate::models::{ListItemKey, MarkerKey, SectionKey};
use crate::utils::linked_list::{LinkedItem, LinkedList, Links, OwnedItem, OwnedStore};

type Result<T> = std::result::Result<T, InvariantViolation>;

slotmap::new_key_type! {
    pub struct RenderKey;
}

/// The model node a render node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostNodeRef {
    Post,
    Section(SectionKey),
    ListItem(ListItemKey),
    Marker(MarkerKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Needs (re-)rendering on the next render pass.
    Dirty,
    Clean,
    /// Will be detached and dropped, with its model node, on the next
    /// render pass.
    ScheduledForRemoval,
}

#[derive(Debug, Clone)]
pub struct RenderNode<N> {
    post_node: PostNodeRef,
    element: Option<N>,
    state: RenderState,
    parent: Option<RenderKey>,
    children: LinkedList<RenderKey>,
    links: Links<RenderKey>,
}

impl<N: Copy> RenderNode<N> {
    fn new(post_node: PostNodeRef) -> Self {
        Self {
            post_node,
            element: None,
            state: RenderState::Dirty,
            parent: None,
            children: LinkedList::new(),
            links: Links::default(),
        }
    }

    pub fn post_node(&self) -> PostNodeRef {
        self.post_node
    }

    pub fn element(&self) -> Option<N> {
        self.element
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == RenderState::Dirty
    }

    pub fn is_removed(&self) -> bool {
        self.state == RenderState::ScheduledForRemoval
    }

    pub fn parent(&self) -> Option<RenderKey> {
        self.parent
    }
}

impl<N> LinkedItem<RenderKey> for RenderNode<N> {
    fn links(&self) -> &Links<RenderKey> {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links<RenderKey> {
        &mut self.links
    }
}

impl<N> OwnedItem<RenderKey> for RenderNode<N> {
    fn set_owner(&mut self, owner: Option<RenderKey>) {
        self.parent = owner;
    }
}

#[derive(Debug, Clone)]
pub struct RenderTree<N> {
    nodes: SlotMap<RenderKey, RenderNode<N>>,
    root: RenderKey,
    by_element: HashMap<N, RenderKey>,
    by_post_node: HashMap<PostNodeRef, RenderKey>,
    pending_removals: Vec<RenderKey>,
}

impl<N: Copy + Eq + Hash + Debug> RenderTree<N> {
    /// A tree whose root stands for the post and is bound to `root_element`.
    pub fn new(root_element: N) -> Self {
        let mut nodes = SlotMap::with_key();
        let mut root_node = RenderNode::new(PostNodeRef::Post);
        root_node.element = Some(root_element);
        let root = nodes.insert(root_node);

        Self {
            nodes,
            root,
            by_element: HashMap::from([(root_element, root)]),
            by_post_node: HashMap::from([(PostNodeRef::Post, root)]),
            pending_removals: Vec::new(),
        }
    }

    pub fn root(&self) -> RenderKey {
        self.root
    }

    pub fn node(&self, key: RenderKey) -> Option<&RenderNode<N>> {
        self.nodes.get(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// A fresh, dirty, unbound and detached node for `post_node`.
    pub fn build_render_node(&mut self, post_node: PostNodeRef) -> RenderKey {
        let key = self.nodes.insert(RenderNode::new(post_node));
        self.by_post_node.insert(post_node, key);
        key
    }

    /// Bind `element` to the node, replacing any element it had.
    pub fn bind_element(&mut self, key: RenderKey, element: N) -> Result<()> {
        match self.by_element.get(&element) {
            Some(&bound) if bound == key => return Ok(()),
            Some(_) => return Err(InvariantViolation::ElementAlreadyBound),
            None => {}
        }
        let node = self
            .nodes
            .get_mut(key)
            .ok_or(InvariantViolation::UnknownRenderNode)?;
        if let Some(previous) = node.element.replace(element) {
            self.by_element.remove(&previous);
        }
        self.by_element.insert(element, key);
        Ok(())
    }

    pub fn element_render_node(&self, element: N) -> Option<RenderKey> {
        self.by_element.get(&element).copied()
    }

    pub fn render_node_for(&self, post_node: PostNodeRef) -> Option<RenderKey> {
        self.by_post_node.get(&post_node).copied()
    }

    pub fn mark_clean(&mut self, key: RenderKey) {
        if let Some(node) = self.nodes.get_mut(key) {
            if node.state == RenderState::Dirty {
                node.state = RenderState::Clean;
            }
        }
    }

    /// Mark the node and every ancestor dirty.
    pub fn mark_dirty(&mut self, key: RenderKey) {
        let mut current = Some(key);
        while let Some(key) = current {
            let Some(node) = self.nodes.get_mut(key) else {
                break;
            };
            if node.state == RenderState::Clean {
                node.state = RenderState::Dirty;
            }
            current = node.parent;
        }
    }

    /// Queue the node for removal. Returns false if it already was queued.
    pub fn schedule_for_removal(&mut self, key: RenderKey) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) if node.state != RenderState::ScheduledForRemoval => {
                node.state = RenderState::ScheduledForRemoval;
                self.pending_removals.push(key);
                true
            }
            _ => false,
        }
    }

    /// Take a node back out of the removal queue, leaving it clean.
    /// Returns false if it was not queued.
    pub fn cancel_removal(&mut self, key: RenderKey) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) if node.state == RenderState::ScheduledForRemoval => {
                node.state = RenderState::Clean;
                self.pending_removals.retain(|pending| *pending != key);
                true
            }
            _ => false,
        }
    }

    pub fn pending_removals(&self) -> &[RenderKey] {
        &self.pending_removals
    }

    pub(crate) fn take_pending_removals(&mut self) -> Vec<RenderKey> {
        std::mem::take(&mut self.pending_removals)
    }

    pub fn children(&self, key: RenderKey) -> Vec<RenderKey> {
        self.nodes
            .get(key)
            .map(|node| node.children.to_array(&self.nodes))
            .unwrap_or_default()
    }

    pub fn append_child(&mut self, parent: RenderKey, child: RenderKey) -> Result<()> {
        self.edit_children(parent, |list, store| list.append(store, child))
    }

    /// Insert `child` after `reference`; `None` makes it the first child.
    pub fn insert_child_after(
        &mut self,
        parent: RenderKey,
        child: RenderKey,
        reference: Option<RenderKey>,
    ) -> Result<()> {
        self.edit_children(parent, |list, store| list.insert_after(store, child, reference))
    }

    /// Move `child` (and its subtree) under `parent`, after `reference`.
    pub fn move_child(
        &mut self,
        child: RenderKey,
        parent: RenderKey,
        reference: Option<RenderKey>,
    ) -> Result<()> {
        if child == self.root {
            return Err(InvariantViolation::UnknownRenderNode);
        }
        let current = self
            .nodes
            .get(child)
            .ok_or(InvariantViolation::UnknownRenderNode)?
            .parent;
        if let Some(current) = current {
            self.edit_children(current, |list, store| list.remove(store, child))?;
        }
        self.insert_child_after(parent, child, reference)
    }

    /// Drop a node and its whole subtree, unbinding everything.
    ///
    /// Returns the external node the removed node was bound to, which the
    /// caller detaches.
    pub fn remove_render_node(&mut self, key: RenderKey) -> Result<Option<N>> {
        if key == self.root {
            return Err(InvariantViolation::UnknownRenderNode);
        }
        let parent = self
            .nodes
            .get(key)
            .ok_or(InvariantViolation::UnknownRenderNode)?
            .parent;
        if let Some(parent) = parent {
            self.edit_children(parent, |list, store| list.remove(store, key))?;
        }

        let element = self.nodes.get(key).and_then(|node| node.element);
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            if let Some(node) = self.nodes.remove(current) {
                if let Some(element) = node.element {
                    self.by_element.remove(&element);
                }
                if self.by_post_node.get(&node.post_node) == Some(&current) {
                    self.by_post_node.remove(&node.post_node);
                }
            }
        }
        self.pending_removals.retain(|pending| self.nodes.contains_key(*pending));
        Ok(element)
    }

    fn edit_children<R, F>(&mut self, parent: RenderKey, f: F) -> Result<R>
    where
        F: FnOnce(&mut LinkedList<RenderKey>, &mut OwnedStore<'_, RenderKey, RenderNode<N>, RenderKey>) -> Result<R>,
    {
        let mut list = self
            .nodes
            .get(parent)
            .ok_or(InvariantViolation::UnknownRenderNode)?
            .children;
        let result = f(&mut list, &mut OwnedStore::new(&mut self.nodes, parent));
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = list;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Builder;
    use pretty_assertions::assert_eq;

    fn marker_keys(n: usize) -> Vec<MarkerKey> {
        let builder = Builder::new();
        let mut post = builder.create_post();
        (0..n)
            .map(|i| builder.create_marker(&mut post, i.to_string(), vec![]))
            .collect()
    }

    #[test]
    fn bindings_work_both_ways() {
        let mut tree = RenderTree::new(0_u32);
        let marker = marker_keys(1)[0];
        let node = tree.build_render_node(PostNodeRef::Marker(marker));
        tree.bind_element(node, 7).unwrap();

        assert_eq!(tree.element_render_node(7), Some(node));
        assert_eq!(tree.render_node_for(PostNodeRef::Marker(marker)), Some(node));
        assert_eq!(tree.element_render_node(0), Some(tree.root()));

        tree.bind_element(node, 8).unwrap();
        assert_eq!(tree.element_render_node(7), None);
        assert_eq!(tree.node(node).unwrap().element(), Some(8));
    }

    #[test]
    fn an_element_binds_to_one_node_only() {
        let mut tree = RenderTree::new(0_u32);
        let markers = marker_keys(2);
        let a = tree.build_render_node(PostNodeRef::Marker(markers[0]));
        let b = tree.build_render_node(PostNodeRef::Marker(markers[1]));
        tree.bind_element(a, 1).unwrap();

        assert_eq!(tree.bind_element(b, 1), Err(InvariantViolation::ElementAlreadyBound));
        assert_eq!(tree.bind_element(b, 0), Err(InvariantViolation::ElementAlreadyBound));
    }

    #[test]
    fn dirtiness_propagates_upwards() {
        let mut tree = RenderTree::new(0_u32);
        let marker = marker_keys(1)[0];
        let node = tree.build_render_node(PostNodeRef::Marker(marker));
        tree.append_child(tree.root(), node).unwrap();
        tree.mark_clean(tree.root());
        tree.mark_clean(node);

        tree.mark_dirty(node);

        assert!(tree.node(node).unwrap().is_dirty());
        assert!(tree.node(tree.root()).unwrap().is_dirty());
    }

    #[test]
    fn removal_is_queued_once() {
        let mut tree = RenderTree::new(0_u32);
        let marker = marker_keys(1)[0];
        let node = tree.build_render_node(PostNodeRef::Marker(marker));

        assert!(tree.schedule_for_removal(node));
        assert!(!tree.schedule_for_removal(node));
        assert_eq!(tree.pending_removals(), &[node]);

        tree.mark_clean(node);
        assert_eq!(tree.node(node).unwrap().state(), RenderState::ScheduledForRemoval);
    }

    #[test]
    fn a_queued_removal_can_be_cancelled() {
        let mut tree = RenderTree::new(0_u32);
        let markers = marker_keys(2);
        let kept = tree.build_render_node(PostNodeRef::Marker(markers[0]));
        let dropped = tree.build_render_node(PostNodeRef::Marker(markers[1]));
        tree.schedule_for_removal(kept);
        tree.schedule_for_removal(dropped);

        assert!(tree.cancel_removal(kept));
        assert!(!tree.cancel_removal(kept));

        assert_eq!(tree.node(kept).unwrap().state(), RenderState::Clean);
        assert_eq!(tree.pending_removals(), &[dropped]);
    }

    #[test]
    fn moving_a_child_reparents_it() {
        let mut tree = RenderTree::new(0_u32);
        let markers = marker_keys(4);
        let keys: Vec<_> = markers
            .iter()
            .map(|&m| tree.build_render_node(PostNodeRef::Marker(m)))
            .collect();
        let root = tree.root();
        tree.append_child(root, keys[0]).unwrap();
        tree.append_child(root, keys[1]).unwrap();
        tree.append_child(keys[0], keys[2]).unwrap();
        tree.append_child(keys[1], keys[3]).unwrap();

        tree.move_child(keys[2], keys[1], Some(keys[3])).unwrap();

        assert!(tree.children(keys[0]).is_empty());
        assert_eq!(tree.children(keys[1]), vec![keys[3], keys[2]]);
        assert_eq!(tree.node(keys[2]).unwrap().parent(), Some(keys[1]));
    }

    #[test]
    fn children_keep_insertion_positions() {
        let mut tree = RenderTree::new(0_u32);
        let markers = marker_keys(3);
        let keys: Vec<_> = markers
            .iter()
            .map(|&m| tree.build_render_node(PostNodeRef::Marker(m)))
            .collect();
        let root = tree.root();

        tree.insert_child_after(root, keys[1], None).unwrap();
        tree.insert_child_after(root, keys[0], None).unwrap();
        tree.insert_child_after(root, keys[2], Some(keys[1])).unwrap();

        assert_eq!(tree.children(root), keys);
        assert_eq!(tree.node(keys[2]).unwrap().parent(), Some(root));
    }

    #[test]
    fn removing_a_node_drops_its_subtree_and_bindings() {
        let mut tree = RenderTree::new(0_u32);
        let markers = marker_keys(2);
        let parent = tree.build_render_node(PostNodeRef::Marker(markers[0]));
        let child = tree.build_render_node(PostNodeRef::Marker(markers[1]));
        tree.append_child(tree.root(), parent).unwrap();
        tree.append_child(parent, child).unwrap();
        tree.bind_element(parent, 1).unwrap();
        tree.bind_element(child, 2).unwrap();
        tree.schedule_for_removal(child);

        let element = tree.remove_render_node(parent).unwrap();

        assert_eq!(element, Some(1));
        assert!(tree.children(tree.root()).is_empty());
        assert_eq!(tree.element_render_node(2), None);
        assert_eq!(tree.render_node_for(PostNodeRef::Marker(markers[1])), None);
        assert!(tree.pending_removals().is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn the_root_cannot_be_removed() {
        let mut tree = RenderTree::new(0_u32);
        let root = tree.root();
        assert_eq!(
            tree.remove_render_node(root),
            Err(InvariantViolation::UnknownRenderNode)
        );
    }
}

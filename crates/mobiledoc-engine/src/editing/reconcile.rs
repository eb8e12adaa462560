use std::collections::HashSet;
use std::ops::AddAssign;

use indexmap::IndexSet;

use crate::dom::{ExternalTree, walk_text_nodes};
use crate::error::{InvariantViolation, Result};
use crate::models::{Builder, ContainerKey, MarkerKey, Post, SectionKey, SectionKind};
use crate::parsing::dom::{collect_markups, transform_html_text};
use crate::rendering::{PostNodeRef, RenderKey, RenderTree};

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub updated: usize,
    /// Markers whose leaf now sits under another container.
    pub moved: usize,
    pub scheduled_for_removal: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for ReconcileReport {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.moved += other.moved;
        self.scheduled_for_removal += other.scheduled_for_removal;
    }
}

/// Re-derives markers from an external tree the user has edited.
///
/// Removals are only scheduled here; they are applied by the next
/// [`EditorDomRenderer`](crate::rendering::EditorDomRenderer) pass.
pub struct Reconciler<'b> {
    builder: &'b mut Builder,
}

impl<'b> Reconciler<'b> {
    pub fn new(builder: &'b mut Builder) -> Self {
        Self { builder }
    }

    /// Reconcile one rendered top-level section against its element.
    pub fn reconcile_section<T: ExternalTree>(
        &mut self,
        post: &mut Post,
        render_tree: &mut RenderTree<T::Node>,
        tree: &T,
        section: SectionKey,
    ) -> Result<ReconcileReport> {
        let (key, element) = bound(render_tree, PostNodeRef::Section(section))
            .ok_or(InvariantViolation::UnboundSection)?;
        let (is_markup, is_list) = {
            let kind = post
                .section(section)
                .ok_or(InvariantViolation::UnknownItem)?
                .kind();
            (
                matches!(kind, SectionKind::Markup(_)),
                matches!(kind, SectionKind::List(_)),
            )
        };

        let mut report = ReconcileReport::default();
        if is_markup {
            report = self.reconcile_leaves(
                post,
                render_tree,
                tree,
                ContainerKey::Section(section),
                key,
                element,
            )?;
        } else if is_list {
            for item in post.list_items(section)? {
                let Some((item_key, item_element)) = bound(render_tree, PostNodeRef::ListItem(item))
                else {
                    log::debug!("list item {item:?} has no element yet, skipping");
                    continue;
                };
                report += self.reconcile_leaves(
                    post,
                    render_tree,
                    tree,
                    ContainerKey::ListItem(item),
                    item_key,
                    item_element,
                )?;
            }
        }

        log::debug!("reconciled section {section:?}: {report:?}");
        Ok(report)
    }

    /// Reconcile every section owning one of the mutated `nodes`, once
    /// each, in document order.
    pub fn reconcile_mutations<T: ExternalTree>(
        &mut self,
        post: &mut Post,
        render_tree: &mut RenderTree<T::Node>,
        tree: &T,
        nodes: &[T::Node],
    ) -> Result<ReconcileReport> {
        let affected: IndexSet<SectionKey> = nodes
            .iter()
            .filter_map(|&node| {
                let section = owning_section(render_tree, tree, node);
                if section.is_none() {
                    log::debug!("mutation at {node:?} is outside any rendered section");
                }
                section
            })
            .collect();

        let mut report = ReconcileReport::default();
        for section in post.section_keys() {
            if !affected.contains(&section) {
                continue;
            }
            report += self.reconcile_section(post, render_tree, tree, section)?;
        }
        Ok(report)
    }

    /// The leaf algorithm shared by markup sections and list items.
    fn reconcile_leaves<T: ExternalTree>(
        &mut self,
        post: &mut Post,
        render_tree: &mut RenderTree<T::Node>,
        tree: &T,
        container: ContainerKey,
        parent_key: RenderKey,
        element: T::Node,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let mut visited: HashSet<RenderKey> = HashSet::new();
        let mut previous: Option<(MarkerKey, RenderKey)> = None;

        for leaf in walk_text_nodes(tree, element) {
            let text = transform_html_text(tree.text(leaf).unwrap_or_default());

            if let Some(key) = render_tree.element_render_node(leaf) {
                visited.insert(key);
                let node = render_tree
                    .node(key)
                    .ok_or(InvariantViolation::UnknownRenderNode)?;
                let PostNodeRef::Marker(marker) = node.post_node() else {
                    return Err(InvariantViolation::UnexpectedBinding.into());
                };
                let render_parent = node.parent();

                if text.is_empty() {
                    if render_tree.schedule_for_removal(key) {
                        log::trace!("leaf {leaf:?} emptied, scheduling marker {marker:?} for removal");
                        report.scheduled_for_removal += 1;
                    }
                    continue;
                }
                if render_tree.cancel_removal(key) {
                    log::trace!("leaf {leaf:?} has text again, keeping marker {marker:?}");
                }

                let owner = post
                    .marker(marker)
                    .ok_or(InvariantViolation::UnknownItem)?
                    .parent();
                if owner != Some(container) || render_parent != Some(parent_key) {
                    log::trace!("leaf {leaf:?} moved into {container:?}, moving marker {marker:?}");
                    if owner.is_some() {
                        post.remove_marker(marker)?;
                    }
                    post.insert_marker_after(container, marker, previous.map(|(m, _)| m))?;
                    render_tree.move_child(key, parent_key, previous.map(|(_, k)| k))?;
                    report.moved += 1;
                }

                let markups = collect_markups(self.builder, tree, leaf, element);
                let current = post
                    .marker_mut(marker)
                    .ok_or(InvariantViolation::UnknownItem)?;
                if current.value() != text || current.markups() != markups.as_slice() {
                    log::trace!("updating marker {marker:?} to {text:?}");
                    current.set_value(text);
                    current.set_markups(markups);
                    report.updated += 1;
                }
                previous = Some((marker, key));
            } else {
                if text.is_empty() {
                    continue;
                }
                let markups = collect_markups(self.builder, tree, leaf, element);
                let marker = self.builder.create_marker(post, text, markups);
                post.insert_marker_after(container, marker, previous.map(|(m, _)| m))?;

                let key = render_tree.build_render_node(PostNodeRef::Marker(marker));
                render_tree.insert_child_after(parent_key, key, previous.map(|(_, k)| k))?;
                render_tree.bind_element(key, leaf)?;
                render_tree.mark_clean(key);
                log::trace!("inserted marker {marker:?} for new leaf {leaf:?}");

                visited.insert(key);
                previous = Some((marker, key));
                report.inserted += 1;
            }
        }

        for child in render_tree.children(parent_key) {
            if !visited.contains(&child) && render_tree.schedule_for_removal(child) {
                report.scheduled_for_removal += 1;
            }
        }
        Ok(report)
    }
}

fn bound<N: Copy + Eq + std::hash::Hash + std::fmt::Debug>(
    render_tree: &RenderTree<N>,
    post_node: PostNodeRef,
) -> Option<(RenderKey, N)> {
    let key = render_tree.render_node_for(post_node)?;
    let element = render_tree.node(key)?.element()?;
    Some((key, element))
}

/// The top-level section whose element contains `node`, walking parents.
fn owning_section<T: ExternalTree>(
    render_tree: &RenderTree<T::Node>,
    tree: &T,
    node: T::Node,
) -> Option<SectionKey> {
    let mut current = Some(node);
    while let Some(node) = current {
        if let Some(key) = render_tree.element_render_node(node) {
            if let Some(PostNodeRef::Section(section)) =
                render_tree.node(key).map(|n| n.post_node())
            {
                return Some(section);
            }
        }
        current = tree.parent(node);
    }
    None
}

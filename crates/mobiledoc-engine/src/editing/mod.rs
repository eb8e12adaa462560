/*!
 * # Editing
 *
 * Incremental edits arrive as mutations of the external tree the post
 * was rendered into. The [`Reconciler`] walks the text leaves of each
 * affected section and brings the markers back in line:
 *
 * - a bound leaf with text updates its marker in place, and takes it
 *   back out of the removal queue if it had been emptied earlier
 * - a bound leaf that now sits under another container moves its marker
 *   and render node there
 * - a bound leaf that is now empty, or no longer under the section,
 *   schedules its render node for removal
 * - an unbound leaf becomes a new marker inserted after the last marker
 *   seen, with a render node bound to the leaf
 *
 * Nothing is removed during the walk. The next
 * [`EditorDomRenderer`](crate::rendering::EditorDomRenderer) pass detaches
 * scheduled nodes and drops their markers, so a batch of mutations is
 * always reconciled against a stable model.
 *
 * ```rust
 * use mobiledoc_engine::dom::{DomTree, ExternalTree, ExternalTreeMut, walk_text_nodes};
 * use mobiledoc_engine::editing::Reconciler;
 * use mobiledoc_engine::models::Builder;
 * use mobiledoc_engine::parsing::MobiledocParser;
 * use mobiledoc_engine::rendering::{EditorDomRenderer, RenderTree};
 *
 * let mut builder = Builder::new();
 * let mut post = MobiledocParser::new(&mut builder)
 *     .parse_json(r#"{"version":"0.1","sections":[[],[[1,"p",[[[],0,"hi"]]]]]}"#)
 *     .unwrap();
 * let mut tree = DomTree::new("div");
 * let mut render_tree = RenderTree::new(tree.root());
 * EditorDomRenderer::new().render(&mut post, &mut render_tree, &mut tree).unwrap();
 *
 * let leaf = walk_text_nodes(&tree, tree.root())[0];
 * tree.set_text(leaf, "hey");
 * let report = Reconciler::new(&mut builder)
 *     .reconcile_mutations(&mut post, &mut render_tree, &tree, &[leaf])
 *     .unwrap();
 * assert_eq!(report.updated, 1);
 * ```
 */

pub mod reconcile;

pub use reconcile::{ReconcileReport, Reconciler};

//! Output side of the engine: the wire-format renderer, and the editor
//! renderer that keeps an external tree in step with a post through a
//! [`RenderTree`].

pub mod editor_dom;
pub mod mobiledoc;
pub mod render_tree;

pub use editor_dom::EditorDomRenderer;
pub use mobiledoc::render_mobiledoc;
pub use render_tree::{PostNodeRef, RenderKey, RenderNode, RenderState, RenderTree};

pub mod dom;
pub mod editing;
pub mod error;
pub mod format;
pub mod models;
pub mod parsing;
pub mod rendering;
pub mod snapshot;
pub mod utils;

// Re-export key types for easier usage
pub use editing::{ReconcileReport, Reconciler};
pub use error::{Error, FormatError, InvariantViolation, Result, ValidationError};
pub use format::Mobiledoc;
pub use models::{Builder, Marker, Markup, Post};
pub use parsing::{
    DomParser, DomParserOptions, MobiledocParser, parse_html, parse_html_with_options,
    parse_post_from_paste,
};
pub use rendering::{EditorDomRenderer, RenderTree, render_mobiledoc};

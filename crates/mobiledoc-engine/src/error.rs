//! Error types for the engine.
//!
//! Three classes of failure exist and none of them is recovered from inside
//! the engine:
//!
//! - [`FormatError`]: malformed or unsupported wire-format input
//! - [`ValidationError`]: an invalid tag name or attribute at construction
//! - [`InvariantViolation`]: a programming error such as re-linking an item
//!   that is still linked, or reconciling a section that was never rendered

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse mobiledoc: {0}")]
    Format(#[from] FormatError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl Error {
    /// Add positional context to format errors; other classes pass through.
    pub(crate) fn at(self, context: impl Into<String>) -> Self {
        match self {
            Error::Format(err) => Error::Format(err.at(context)),
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unsupported mobiledoc version {0:?}")]
    UnsupportedVersion(String),

    #[error("unexpected section type {0}")]
    UnknownSectionType(u64),

    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error("markup type index {index} is out of range (table has {len} entries)")]
    MarkupIndexOutOfRange { index: usize, len: usize },

    #[error("marker closes {requested} markups but only {open} are open")]
    CloseCountOverflow { requested: usize, open: usize },

    #[error("invalid markup type: {0}")]
    InvalidMarkupType(#[source] ValidationError),

    #[error("invalid section: {0}")]
    InvalidSection(#[source] ValidationError),

    #[error("{context}: {source}")]
    At {
        context: String,
        #[source]
        source: Box<FormatError>,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FormatError {
    pub(crate) fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        FormatError::Malformed {
            what,
            reason: reason.into(),
        }
    }

    /// Wrap this error with the position it occurred at ("section 2, marker 0").
    pub fn at(self, context: impl Into<String>) -> Self {
        FormatError::At {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all positional context stripped.
    pub fn root_cause(&self) -> &FormatError {
        match self {
            FormatError::At { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Cannot create markup of tagName {0}")]
    InvalidMarkupTag(String),

    #[error("Cannot use attribute {attribute:?} on markup {tag_name}")]
    InvalidAttribute { tag_name: String, attribute: String },

    #[error("Cannot create markup section of tagName {0}")]
    InvalidMarkupSectionTag(String),

    #[error("Cannot create list section of tagName {0}")]
    InvalidListSectionTag(String),

    #[error("Card sections must have a name")]
    EmptyCardName,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("item is already linked into a list and must be removed before re-insertion")]
    AlreadyLinked,

    #[error("item is not linked into this list")]
    NotLinked,

    #[error("item is not known to the store backing this list")]
    UnknownItem,

    #[error("splice requested removal of {requested} items but only {available} follow the reference")]
    SpliceOutOfRange { requested: usize, available: usize },

    #[error("splice received the same item more than once")]
    DuplicateSpliceItem,

    #[error("{0} is not a marker container")]
    NotAMarkerContainer(&'static str),

    #[error("{0} is not a list section")]
    NotAListSection(&'static str),

    #[error("cannot join a {target} section with a {other} section")]
    IncompatibleJoin {
        target: &'static str,
        other: &'static str,
    },

    #[error("section has no bound render node")]
    UnboundSection,

    #[error("model node already has a render node")]
    AlreadyRendered,

    #[error("external node is already bound to another render node")]
    ElementAlreadyBound,

    #[error("render node is not known to the render tree")]
    UnknownRenderNode,

    #[error("external text node is bound to a render node that does not render a marker")]
    UnexpectedBinding,
}

//! # Snapshot Testing Support
//!
//! Helpers for asserting on whole posts.
//!
//! - **`normalize`**: renders a post as a compact, stable text outline for
//!   `insta` snapshots and plain string comparisons
//! - **`invariants`**: structural checks every post must pass (link
//!   consistency, owner back-references, well-nested markup stacks)

pub mod invariants;
pub mod normalize;

pub use invariants::check as invariants;
pub use normalize::outline;

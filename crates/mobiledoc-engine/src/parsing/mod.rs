pub mod dom;
pub mod mobiledoc;
pub mod paste;
mod section;

pub use dom::{DomParser, DomParserOptions, detect_root_element, transform_html_text};
pub use mobiledoc::MobiledocParser;
pub use paste::parse_post_from_paste;

use crate::dom::{ExternalTree, parse_fragment};
use crate::error::Result;
use crate::models::{Builder, Post};

/// Parse raw HTML with the default import options.
pub fn parse_html(html: &str, builder: &mut Builder) -> Result<Post> {
    parse_html_with_options(html, builder, DomParserOptions::default())
}

pub fn parse_html_with_options(
    html: &str,
    builder: &mut Builder,
    options: DomParserOptions,
) -> Result<Post> {
    let tree = parse_fragment(html);
    DomParser::with_options(builder, options).parse(&tree, tree.root())
}

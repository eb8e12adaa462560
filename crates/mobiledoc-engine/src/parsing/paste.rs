use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::models::{Builder, Post};

use super::{DomParserOptions, MobiledocParser, parse_html_with_options};

/// The serialized document embedded in copied editor HTML, if any.
pub fn extract_embedded_mobiledoc(html: &str) -> Option<String> {
    static EMBEDDED: OnceLock<Regex> = OnceLock::new();
    let re = EMBEDDED
        .get_or_init(|| Regex::new(r"(?s)data-mobiledoc='(.*?)'>").expect("valid regex"));
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
}

/// Parse pasted HTML. An embedded mobiledoc wins over the markup around it.
pub fn parse_post_from_paste(
    html: &str,
    builder: &mut Builder,
    options: DomParserOptions,
) -> Result<Post> {
    match extract_embedded_mobiledoc(html) {
        Some(json) => {
            log::debug!("paste carries an embedded mobiledoc ({} bytes)", json.len());
            MobiledocParser::new(builder).parse_json(&json)
        }
        None => parse_html_with_options(html, builder, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FormatError};
    use crate::snapshot::normalize::outline;
    use pretty_assertions::assert_eq;

    #[test]
    fn embedded_document_is_preferred() {
        let html = r#"<div data-mobiledoc='{"version":"0.1","sections":[[["b",[]]],[[1,"h2",[[[0],1,"kept"]]]]]}'><p>ignored</p></div>"#;
        let mut builder = Builder::new();

        let post = parse_post_from_paste(html, &mut builder, DomParserOptions::default()).unwrap();

        assert_eq!(outline(&post), "h2: \"kept\" [b]/1");
    }

    #[test]
    fn entities_in_the_attribute_are_decoded() {
        let html = "<div data-mobiledoc='{&quot;version&quot;:&quot;0.1&quot;,&quot;sections&quot;:[[],[]]}'></div>";
        assert_eq!(
            extract_embedded_mobiledoc(html).as_deref(),
            Some(r#"{"version":"0.1","sections":[[],[]]}"#)
        );
    }

    #[test]
    fn match_stops_at_the_first_closing_quote() {
        let html = "<div data-mobiledoc='{}'><span title='x'>y</span></div>";
        assert_eq!(extract_embedded_mobiledoc(html).as_deref(), Some("{}"));
    }

    #[test]
    fn plain_html_falls_back_to_the_dom_parser() {
        let mut builder = Builder::new();
        let post =
            parse_post_from_paste("<p>abc<b>de</b>f</p>", &mut builder, DomParserOptions::default())
                .unwrap();
        assert_eq!(outline(&post), "p: \"abc\" | \"de\" [strong]/1 | \"f\"");
    }

    #[test]
    fn broken_embedded_json_is_an_error() {
        let mut builder = Builder::new();
        let err = parse_post_from_paste(
            "<div data-mobiledoc='{not json'></div>",
            &mut builder,
            DomParserOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::Json(_))));
    }
}

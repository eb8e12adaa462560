//! Tokenizer for HTML fragments.
//!
//! The lexer only splits the input into tags and text; it does not know
//! about nesting. Anything Logos cannot match (a lone `<`, an unterminated
//! tag) comes back as text so no content is lost.

use logos::{Lexer, Logos};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlToken {
    /// `<!-- ... -->`, consumed through the closing `-->` or end of input.
    #[token("<!--", comment)]
    Comment,

    /// `<!DOCTYPE ...>` and other declarations.
    #[regex(r"<![^-][^>]*>")]
    Declaration,

    /// `</name>`
    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>")]
    EndTag,

    /// `<name attr="value" ...>`, including self-closing forms.
    #[regex(r#"<[a-zA-Z][a-zA-Z0-9-]*([^>"']|"[^"]*"|'[^']*')*>"#)]
    StartTag,

    #[regex(r"[^<]+")]
    Text,
}

fn comment(lex: &mut Lexer<HtmlToken>) {
    let rest = lex.remainder();
    let len = rest.find("-->").map_or(rest.len(), |i| i + 3);
    lex.bump(len);
}

/// A lexed token with its kind and source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: HtmlToken,
    pub text: &'a str,
}

pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = HtmlToken::lexer(input);

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        let kind = result.unwrap_or(HtmlToken::Text);
        tokens.push(Token { kind, text });
    }

    tokens
}

/// Parsed pieces of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

/// Split a `StartTag` token into name and decoded attributes.
pub fn parse_start_tag(text: &str) -> StartTag {
    let inner = text.trim_start_matches('<').trim_end_matches('>');
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();

    let mut attributes = Vec::new();
    let mut rest = &inner[name_end..];
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }

        let key_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (raw, remaining) = split_attribute_value(after_eq);
            rest = remaining;
            html_escape::decode_html_entities(raw).into_owned()
        } else {
            String::new()
        };

        if !key.is_empty() && !attributes.iter().any(|(k, _)| *k == key) {
            attributes.push((key, value));
        }
    }

    StartTag {
        name,
        attributes,
        self_closing,
    }
}

fn split_attribute_value(input: &str) -> (&str, &str) {
    for quote in ['"', '\''] {
        if let Some(body) = input.strip_prefix(quote) {
            return match body.find(quote) {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            };
        }
    }
    let end = input
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(input.len());
    (&input[..end], &input[end..])
}

/// Tag name of an `EndTag` token.
pub fn end_tag_name(text: &str) -> String {
    text.trim_start_matches("</")
        .trim_end_matches('>')
        .trim()
        .to_ascii_lowercase()
}

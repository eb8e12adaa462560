use crate::dom::{ExternalTree, element_tag, walk_text_nodes};
use crate::error::Result;
use crate::models::markup::normalize_tag_name;
use crate::models::{Builder, ContainerKey, ListSection, MarkupSection, Post, SectionKey};

use super::dom::{DomParserOptions, collect_markups, normalize_imported_text};

/// Turns one top-level node into zero or more detached sections.
///
/// - text and inline elements go into an inferred `p`
/// - `p`, `h1`-`h6` and `blockquote` become markup sections
/// - `ul` / `ol` become list sections, one item per `li`
/// - `img` becomes an image section
/// - any other element is a block container whose children are parsed
///   the same way
pub(crate) struct SectionParser<'b> {
    builder: &'b mut Builder,
    options: DomParserOptions,
}

impl<'b> SectionParser<'b> {
    pub(crate) fn new(builder: &'b mut Builder, options: DomParserOptions) -> Self {
        Self { builder, options }
    }

    /// Sections for `node`, a child of `root`. Inline content directly
    /// under `root` collects markups up to (not including) `root`.
    pub(crate) fn parse<T: ExternalTree>(
        &mut self,
        tree: &T,
        post: &mut Post,
        root: T::Node,
        node: T::Node,
    ) -> Result<Vec<SectionKey>> {
        let mut state = ParseState::default();
        self.visit(tree, post, root, node, &mut state)?;
        Ok(state.sections)
    }

    fn visit<T: ExternalTree>(
        &mut self,
        tree: &T,
        post: &mut Post,
        root: T::Node,
        node: T::Node,
        state: &mut ParseState,
    ) -> Result<()> {
        if tree.is_text(node) {
            let text = tree.text(node).unwrap_or_default();
            if state.inferred.is_none() && text.trim().is_empty() {
                return Ok(());
            }
            let section = self.inferred_section(post, state)?;
            return self.append_inline(tree, post, ContainerKey::Section(section), node, root);
        }

        let Some(tag_name) = element_tag(tree, node) else {
            return Ok(());
        };

        if MarkupSection::is_valid_tag(&tag_name) {
            state.inferred = None;
            let section = self
                .builder
                .create_markup_section(post, Some(&tag_name))?;
            self.append_inline(tree, post, ContainerKey::Section(section), node, node)?;
            state.sections.push(section);
        } else if ListSection::is_valid_tag(&tag_name) {
            state.inferred = None;
            let section = self.parse_list(tree, post, node, &tag_name)?;
            state.sections.push(section);
        } else if tag_name == "img" {
            state.inferred = None;
            let src = tree.attribute(node, "src");
            state
                .sections
                .push(self.builder.create_image_section(post, src));
        } else if is_inline(&tag_name) {
            let section = self.inferred_section(post, state)?;
            self.append_inline(tree, post, ContainerKey::Section(section), node, root)?;
        } else {
            state.inferred = None;
            for child in tree.children(node) {
                self.visit(tree, post, node, child, state)?;
            }
            state.inferred = None;
        }
        Ok(())
    }

    fn inferred_section(&mut self, post: &mut Post, state: &mut ParseState) -> Result<SectionKey> {
        if let Some(section) = state.inferred {
            return Ok(section);
        }
        let section = self.builder.create_markup_section(post, None)?;
        state.sections.push(section);
        state.inferred = Some(section);
        Ok(section)
    }

    fn parse_list<T: ExternalTree>(
        &mut self,
        tree: &T,
        post: &mut Post,
        list: T::Node,
        tag_name: &str,
    ) -> Result<SectionKey> {
        let section = self.builder.create_list_section(post, Some(tag_name))?;
        for child in tree.children(list) {
            let is_item = element_tag(tree, child).is_some_and(|t| t == "li");
            if !is_item && walk_text_nodes(tree, child)
                .iter()
                .all(|&t| tree.text(t).unwrap_or_default().trim().is_empty())
            {
                continue;
            }

            let item = self.builder.create_list_item(post);
            post.append_list_item(section, item)?;
            let boundary = if is_item { child } else { list };
            self.append_inline(tree, post, ContainerKey::ListItem(item), child, boundary)?;
        }
        Ok(section)
    }

    /// Append a marker for every non-empty text node under `node`.
    fn append_inline<T: ExternalTree>(
        &mut self,
        tree: &T,
        post: &mut Post,
        container: ContainerKey,
        node: T::Node,
        boundary: T::Node,
    ) -> Result<()> {
        for text_node in walk_text_nodes(tree, node) {
            let raw = tree.text(text_node).unwrap_or_default();
            let text = normalize_imported_text(raw, self.options.collapse_whitespace);
            if text.is_empty() {
                continue;
            }
            let markups = collect_markups(self.builder, tree, text_node, boundary);
            let marker = self.builder.create_marker(post, text, markups);
            post.append_marker(container, marker)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct ParseState {
    sections: Vec<SectionKey>,
    /// The inferred paragraph loose inline content is currently going to.
    inferred: Option<SectionKey>,
}

fn is_inline(tag_name: &str) -> bool {
    let tag_name = normalize_tag_name(tag_name);
    matches!(
        tag_name.as_str(),
        "a" | "abbr"
            | "b"
            | "br"
            | "code"
            | "em"
            | "font"
            | "i"
            | "li"
            | "mark"
            | "s"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "u"
    )
}

use std::rc::Rc;

use crate::error::{Error, FormatError, Result};
use crate::format::{MOBILEDOC_VERSION, MarkerData, Mobiledoc, SectionData};
use crate::models::{Builder, ContainerKey, Marker, Markup, Post};

/// Builds a [`Post`] from a wire-format document.
///
/// Markers are decoded against a running stack of open markups: each
/// marker pushes its opened markups, takes a snapshot of the stack as its
/// own markup list, then pops its close count. Any failure aborts the
/// whole parse; no partial post is returned.
pub struct MobiledocParser<'b> {
    builder: &'b mut Builder,
    markup_types: Vec<Rc<Markup>>,
    open: Vec<Rc<Markup>>,
}

impl<'b> MobiledocParser<'b> {
    pub fn new(builder: &'b mut Builder) -> Self {
        Self {
            builder,
            markup_types: Vec::new(),
            open: Vec::new(),
        }
    }

    pub fn parse(&mut self, doc: &Mobiledoc) -> Result<Post> {
        if doc.version != MOBILEDOC_VERSION {
            return Err(FormatError::UnsupportedVersion(doc.version.clone()).into());
        }
        let (marker_types, sections) = &doc.sections;

        let mut markup_types = Vec::with_capacity(marker_types.len());
        for (i, marker_type) in marker_types.iter().enumerate() {
            let markup = self
                .builder
                .create_markup(&marker_type.0, marker_type.attribute_pairs())
                .map_err(|e| FormatError::InvalidMarkupType(e).at(format!("marker type {i}")))?;
            markup_types.push(markup);
        }
        self.markup_types = markup_types;

        let mut post = self.builder.create_post();
        for (i, section) in sections.iter().enumerate() {
            self.parse_section(&mut post, section)
                .map_err(|e| e.at(format!("section {i}")))?;
        }

        log::debug!(
            "parsed mobiledoc: {} sections, {} marker types",
            post.sections().len(),
            self.markup_types.len()
        );
        Ok(post)
    }

    /// Parse a JSON string.
    pub fn parse_json(&mut self, input: &str) -> Result<Post> {
        let doc = Mobiledoc::from_json(input)?;
        self.parse(&doc)
    }

    fn parse_section(&mut self, post: &mut Post, section: &SectionData) -> Result<()> {
        let key = match section {
            SectionData::Markup { tag_name, markers } => {
                let key = self
                    .builder
                    .create_markup_section(post, Some(tag_name))
                    .map_err(FormatError::InvalidSection)?;
                let container = ContainerKey::Section(key);
                self.parse_markers(post, container, markers)?;
                // Only now, so the stack above saw every marker.
                post.discard_markers_by(container, Marker::is_empty)?;
                key
            }
            SectionData::Image { src } => self.builder.create_image_section(post, src.as_deref()),
            SectionData::List { tag_name, items } => {
                let key = self
                    .builder
                    .create_list_section(post, Some(tag_name))
                    .map_err(FormatError::InvalidSection)?;
                for (i, markers) in items.iter().enumerate() {
                    let item = self.builder.create_list_item(post);
                    post.append_list_item(key, item)?;
                    self.parse_markers(post, ContainerKey::ListItem(item), markers)
                        .map_err(|e| e.at(format!("item {i}")))?;
                }
                key
            }
            SectionData::Card { name, payload } => self
                .builder
                .create_card_section(post, name, Some(payload.clone()))
                .map_err(FormatError::InvalidSection)?,
        };
        post.append_section(key)?;
        Ok(())
    }

    fn parse_markers(
        &mut self,
        post: &mut Post,
        container: ContainerKey,
        markers: &[MarkerData],
    ) -> Result<()> {
        self.open.clear();
        for (i, marker) in markers.iter().enumerate() {
            self.parse_marker(post, container, marker)
                .map_err(|e| e.at(format!("marker {i}")))?;
        }
        Ok(())
    }

    fn parse_marker(
        &mut self,
        post: &mut Post,
        container: ContainerKey,
        MarkerData(opens, close_count, value): &MarkerData,
    ) -> Result<()> {
        for &index in opens {
            let markup = self
                .markup_types
                .get(index)
                .ok_or(FormatError::MarkupIndexOutOfRange {
                    index,
                    len: self.markup_types.len(),
                })?;
            self.open.push(Rc::clone(markup));
        }

        let marker = self
            .builder
            .create_marker(post, value.as_str(), self.open.clone());
        post.append_marker(container, marker)?;

        if *close_count > self.open.len() {
            return Err(Error::Format(FormatError::CloseCountOverflow {
                requested: *close_count,
                open: self.open.len(),
            }));
        }
        self.open.truncate(self.open.len() - close_count);
        Ok(())
    }
}

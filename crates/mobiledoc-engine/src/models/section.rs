use serde_json::Value;

use crate::error::ValidationError;
use crate::models::markup::normalize_tag_name;
use crate::models::{ListItemKey, MarkerKey, SectionKey};
use crate::utils::linked_list::{LinkedItem, LinkedList, Links, OwnedItem};

pub const MARKUP_SECTION_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote"];
pub const DEFAULT_MARKUP_SECTION_TAG: &str = "p";

pub const LIST_SECTION_TAGS: &[&str] = &["ul", "ol"];
pub const DEFAULT_LIST_SECTION_TAG: &str = "ul";

/// A top-level block of the post.
#[derive(Debug, Clone)]
pub struct Section {
    kind: SectionKind,
    links: Links<SectionKey>,
}

#[derive(Debug, Clone)]
pub enum SectionKind {
    Markup(MarkupSection),
    List(ListSection),
    Image(ImageSection),
    Card(CardSection),
}

#[derive(Debug, Clone)]
pub struct MarkupSection {
    tag_name: String,
    inferred: bool,
    pub(crate) markers: LinkedList<MarkerKey>,
}

#[derive(Debug, Clone)]
pub struct ListSection {
    tag_name: String,
    pub(crate) items: LinkedList<ListItemKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSection {
    src: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardSection {
    name: String,
    payload: Value,
}

/// One item of a list section; holds markers like a markup section does.
#[derive(Debug, Clone)]
pub struct ListItem {
    pub(crate) markers: LinkedList<MarkerKey>,
    parent: Option<SectionKey>,
    links: Links<ListItemKey>,
}

impl Section {
    pub(crate) fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            links: Links::default(),
        }
    }

    pub fn kind(&self) -> &SectionKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut SectionKind {
        &mut self.kind
    }

    /// Tag name for markup and list sections.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            SectionKind::Markup(s) => Some(s.tag_name()),
            SectionKind::List(s) => Some(s.tag_name()),
            SectionKind::Image(_) | SectionKind::Card(_) => None,
        }
    }

    pub fn links(&self) -> &Links<SectionKey> {
        &self.links
    }
}

impl SectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Markup(_) => "markup",
            SectionKind::List(_) => "list",
            SectionKind::Image(_) => "image",
            SectionKind::Card(_) => "card",
        }
    }
}

impl MarkupSection {
    pub(crate) fn new(tag_name: Option<&str>) -> Result<Self, ValidationError> {
        let inferred = tag_name.is_none();
        let tag_name = normalize_tag_name(tag_name.unwrap_or(DEFAULT_MARKUP_SECTION_TAG));
        if !MARKUP_SECTION_TAGS.contains(&tag_name.as_str()) {
            return Err(ValidationError::InvalidMarkupSectionTag(tag_name));
        }
        Ok(Self {
            tag_name,
            inferred,
            markers: LinkedList::new(),
        })
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// True when the tag was defaulted rather than taken from input.
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    pub fn markers(&self) -> &LinkedList<MarkerKey> {
        &self.markers
    }

    pub fn is_valid_tag(tag_name: &str) -> bool {
        MARKUP_SECTION_TAGS
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag_name))
    }
}

impl ListSection {
    pub(crate) fn new(tag_name: Option<&str>) -> Result<Self, ValidationError> {
        let tag_name = normalize_tag_name(tag_name.unwrap_or(DEFAULT_LIST_SECTION_TAG));
        if !LIST_SECTION_TAGS.contains(&tag_name.as_str()) {
            return Err(ValidationError::InvalidListSectionTag(tag_name));
        }
        Ok(Self {
            tag_name,
            items: LinkedList::new(),
        })
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn items(&self) -> &LinkedList<ListItemKey> {
        &self.items
    }

    pub fn is_valid_tag(tag_name: &str) -> bool {
        LIST_SECTION_TAGS
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag_name))
    }
}

impl ImageSection {
    pub(crate) fn new(src: Option<String>) -> Self {
        Self { src }
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }
}

impl CardSection {
    pub(crate) fn new(name: &str, payload: Value) -> Result<Self, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::EmptyCardName);
        }
        Ok(Self {
            name: name.to_string(),
            payload,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

impl ListItem {
    pub(crate) fn new() -> Self {
        Self {
            markers: LinkedList::new(),
            parent: None,
            links: Links::default(),
        }
    }

    pub fn markers(&self) -> &LinkedList<MarkerKey> {
        &self.markers
    }

    pub fn parent(&self) -> Option<SectionKey> {
        self.parent
    }

    pub fn links(&self) -> &Links<ListItemKey> {
        &self.links
    }
}

impl LinkedItem<SectionKey> for Section {
    fn links(&self) -> &Links<SectionKey> {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links<SectionKey> {
        &mut self.links
    }
}

impl LinkedItem<ListItemKey> for ListItem {
    fn links(&self) -> &Links<ListItemKey> {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links<ListItemKey> {
        &mut self.links
    }
}

impl OwnedItem<SectionKey> for ListItem {
    fn set_owner(&mut self, owner: Option<SectionKey>) {
        self.parent = owner;
    }
}

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::error::ValidationError;
use crate::models::{
    CardSection, ImageSection, ListItem, ListItemKey, ListSection, Marker, MarkerKey, Markup,
    MarkupSection, Post, Section, SectionKey, SectionKind,
};

/// The only way model entities come into existence.
///
/// Sections, list items and markers are created detached inside the
/// given post's arenas; callers link them where they belong. Markups are
/// interned per builder, so every marker built through one builder shares
/// one `Rc` per distinct `(tag, attributes)`.
#[derive(Debug, Default)]
pub struct Builder {
    markups: HashMap<(String, Vec<(String, String)>), Rc<Markup>>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_post(&self) -> Post {
        Post::new()
    }

    pub fn create_markup<I, K, V>(
        &mut self,
        tag_name: &str,
        attributes: I,
    ) -> Result<Rc<Markup>, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let markup = Markup::new(tag_name, attributes)?;
        let shared = self
            .markups
            .entry(markup.intern_key())
            .or_insert_with(|| Rc::new(markup));
        Ok(Rc::clone(shared))
    }

    /// A markup section with an empty marker list. `None` gives the
    /// default `p` tag, flagged as inferred.
    pub fn create_markup_section(
        &self,
        post: &mut Post,
        tag_name: Option<&str>,
    ) -> Result<SectionKey, ValidationError> {
        let section = MarkupSection::new(tag_name)?;
        Ok(post.add_section(Section::new(SectionKind::Markup(section))))
    }

    pub fn create_list_section(
        &self,
        post: &mut Post,
        tag_name: Option<&str>,
    ) -> Result<SectionKey, ValidationError> {
        let section = ListSection::new(tag_name)?;
        Ok(post.add_section(Section::new(SectionKind::List(section))))
    }

    pub fn create_list_item(&self, post: &mut Post) -> ListItemKey {
        post.add_list_item(ListItem::new())
    }

    pub fn create_image_section(&self, post: &mut Post, src: Option<&str>) -> SectionKey {
        let image = ImageSection::new(src.map(str::to_string));
        post.add_section(Section::new(SectionKind::Image(image)))
    }

    /// A card section; a missing payload becomes an empty object.
    pub fn create_card_section(
        &self,
        post: &mut Post,
        name: &str,
        payload: Option<Value>,
    ) -> Result<SectionKey, ValidationError> {
        let payload = payload.unwrap_or_else(|| Value::Object(Default::default()));
        let card = CardSection::new(name, payload)?;
        Ok(post.add_section(Section::new(SectionKind::Card(card))))
    }

    pub fn create_marker(
        &self,
        post: &mut Post,
        value: impl Into<String>,
        markups: Vec<Rc<Markup>>,
    ) -> MarkerKey {
        post.add_marker(Marker::new(value.into(), markups))
    }
}

use indexmap::IndexMap;

use crate::error::ValidationError;

/// Inline tags a [`Markup`] may carry, lower case.
pub const VALID_MARKUP_TAGS: &[&str] = &["b", "i", "strong", "em", "a", "li"];

/// Attribute keys a [`Markup`] may carry.
pub const VALID_ATTRIBUTES: &[&str] = &["href", "ref"];

/// One inline formatting descriptor, e.g. `strong` or `a href=...`.
///
/// Markups are immutable once built. Markers hold them behind `Rc` so that
/// a run of markers sharing one link or one emphasis share one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    tag_name: String,
    attributes: IndexMap<String, String>,
}

impl Markup {
    /// Build a markup, normalising the tag name to lower case.
    ///
    /// Fails when the tag or any attribute key is outside the allow-lists.
    pub fn new<I, K, V>(tag_name: &str, attributes: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tag_name = normalize_tag_name(tag_name);
        if !Self::is_valid_tag(&tag_name) {
            return Err(ValidationError::InvalidMarkupTag(tag_name));
        }

        let mut map = IndexMap::new();
        for (key, value) in attributes {
            let key = key.into();
            if !VALID_ATTRIBUTES.contains(&key.as_str()) {
                return Err(ValidationError::InvalidAttribute {
                    tag_name,
                    attribute: key,
                });
            }
            map.insert(key, value.into());
        }

        Ok(Self {
            tag_name,
            attributes: map,
        })
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_tag(&self, tag_name: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag_name)
    }

    pub fn is_valid_tag(tag_name: &str) -> bool {
        VALID_MARKUP_TAGS
            .iter()
            .any(|valid| valid.eq_ignore_ascii_case(tag_name))
    }

    /// Attributes as `[k, v, k, v, ...]` in insertion order.
    pub fn flattened_attributes(&self) -> Vec<String> {
        self.attributes
            .iter()
            .flat_map(|(k, v)| [k.clone(), v.clone()])
            .collect()
    }

    /// Key that identifies this markup structurally, attribute order included.
    pub(crate) fn intern_key(&self) -> (String, Vec<(String, String)>) {
        (
            self.tag_name.clone(),
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

pub(crate) fn normalize_tag_name(tag_name: &str) -> String {
    tag_name.to_ascii_lowercase()
}

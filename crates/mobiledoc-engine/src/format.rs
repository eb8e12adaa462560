//! # Mobiledoc Wire Format
//!
//! ```text
//! Document        := { version, sections: [MarkerTypeTable, [Section...]] }
//! MarkerTypeTable := [ [tagName, [k, v, k, v, ...]], ... ]
//! MarkupSection   := [1, tagName, [Marker...]]
//! ImageSection    := [2, src]
//! ListSection     := [3, tagName, [[Marker...], ...]]
//! CardSection     := [10, name, payload]
//! Marker          := [[openIndex...], closeCount, value]
//! ```
//!
//! Serialisation goes through serde. Reading is done by hand from a
//! [`serde_json::Value`] so that each failure maps to a specific
//! [`FormatError`] carrying the position it happened at.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::FormatError;

pub const MOBILEDOC_VERSION: &str = "0.1";

pub const MARKUP_SECTION_TYPE: u64 = 1;
pub const IMAGE_SECTION_TYPE: u64 = 2;
pub const LIST_SECTION_TYPE: u64 = 3;
pub const CARD_SECTION_TYPE: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mobiledoc {
    pub version: String,
    pub sections: (Vec<MarkerType>, Vec<SectionData>),
}

/// `[tagName, [k, v, ...]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerType(pub String, pub Vec<String>);

/// `[openIndexes, closeCount, value]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerData(pub Vec<usize>, pub usize, pub String);

#[derive(Debug, Clone, PartialEq)]
pub enum SectionData {
    Markup {
        tag_name: String,
        markers: Vec<MarkerData>,
    },
    Image {
        src: Option<String>,
    },
    List {
        tag_name: String,
        items: Vec<Vec<MarkerData>>,
    },
    Card {
        name: String,
        payload: Value,
    },
}

impl Serialize for SectionData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SectionData::Markup { tag_name, markers } => {
                (MARKUP_SECTION_TYPE, tag_name, markers).serialize(serializer)
            }
            SectionData::Image { src } => (IMAGE_SECTION_TYPE, src).serialize(serializer),
            SectionData::List { tag_name, items } => {
                (LIST_SECTION_TYPE, tag_name, items).serialize(serializer)
            }
            SectionData::Card { name, payload } => {
                (CARD_SECTION_TYPE, name, payload).serialize(serializer)
            }
        }
    }
}

impl Mobiledoc {
    pub fn from_json(input: &str) -> Result<Self, FormatError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, FormatError> {
        let object = value
            .as_object()
            .ok_or_else(|| FormatError::malformed("document", "expected an object"))?;

        let version = object
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| FormatError::malformed("document", "missing string `version`"))?
            .to_string();

        let sections = as_array(
            object
                .get("sections")
                .ok_or_else(|| FormatError::malformed("document", "missing `sections`"))?,
            "sections",
        )?;
        let [marker_types, section_list] = sections else {
            return Err(FormatError::malformed(
                "sections",
                format!("expected [markerTypes, sections], got {} entries", sections.len()),
            ));
        };

        let marker_types = as_array(marker_types, "marker type table")?
            .iter()
            .enumerate()
            .map(|(i, v)| MarkerType::from_value(v).map_err(|e| e.at(format!("marker type {i}"))))
            .collect::<Result<Vec<_>, _>>()?;

        let section_list = as_array(section_list, "section list")?
            .iter()
            .enumerate()
            .map(|(i, v)| SectionData::from_value(v).map_err(|e| e.at(format!("section {i}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version,
            sections: (marker_types, section_list),
        })
    }

    pub fn to_value(&self) -> Value {
        // Serialising plain strings, integers and JSON values cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, FormatError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

impl MarkerType {
    fn from_value(value: &Value) -> Result<Self, FormatError> {
        let entry = as_array(value, "marker type")?;
        let tag_name = entry
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| FormatError::malformed("marker type", "missing tag name"))?;
        let attributes = match entry.get(1) {
            None | Some(Value::Null) => Vec::new(),
            Some(pairs) => as_array(pairs, "marker type attributes")?
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        FormatError::malformed("marker type attributes", "expected strings")
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        if attributes.len() % 2 != 0 {
            return Err(FormatError::malformed(
                "marker type attributes",
                "expected key/value pairs",
            ));
        }
        Ok(Self(tag_name.to_string(), attributes))
    }

    /// Attribute pairs from the flattened list.
    pub fn attribute_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.1
            .chunks_exact(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }
}

impl MarkerData {
    fn from_value(value: &Value) -> Result<Self, FormatError> {
        let entry = as_array(value, "marker")?;
        let [opens, close, text] = entry else {
            return Err(FormatError::malformed(
                "marker",
                format!("expected 3 fields, got {}", entry.len()),
            ));
        };
        let opens = as_array(opens, "marker open indexes")?
            .iter()
            .map(|v| as_index(v, "marker open index"))
            .collect::<Result<Vec<_>, _>>()?;
        let close = as_index(close, "marker close count")?;
        let text = text
            .as_str()
            .ok_or_else(|| FormatError::malformed("marker", "value must be a string"))?;
        Ok(Self(opens, close, text.to_string()))
    }
}

impl SectionData {
    fn from_value(value: &Value) -> Result<Self, FormatError> {
        let entry = as_array(value, "section")?;
        let code = entry
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| FormatError::malformed("section", "missing numeric type code"))?;

        match code {
            MARKUP_SECTION_TYPE => Ok(SectionData::Markup {
                tag_name: string_field(entry, 1, "markup section tag")?,
                markers: markers_from(field(entry, 2, "markup section markers")?)?,
            }),
            IMAGE_SECTION_TYPE => {
                let src = match entry.get(1) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(src)) => Some(src.clone()),
                    Some(_) => {
                        return Err(FormatError::malformed("image section", "src must be a string"));
                    }
                };
                Ok(SectionData::Image { src })
            }
            LIST_SECTION_TYPE => {
                let items = as_array(field(entry, 2, "list section items")?, "list section items")?
                    .iter()
                    .enumerate()
                    .map(|(i, item)| markers_from(item).map_err(|e| e.at(format!("item {i}"))))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SectionData::List {
                    tag_name: string_field(entry, 1, "list section tag")?,
                    items,
                })
            }
            CARD_SECTION_TYPE => Ok(SectionData::Card {
                name: string_field(entry, 1, "card name")?,
                payload: entry.get(2).cloned().unwrap_or(Value::Null),
            }),
            other => Err(FormatError::UnknownSectionType(other)),
        }
    }
}

fn markers_from(value: &Value) -> Result<Vec<MarkerData>, FormatError> {
    as_array(value, "marker list")?
        .iter()
        .enumerate()
        .map(|(i, m)| MarkerData::from_value(m).map_err(|e| e.at(format!("marker {i}"))))
        .collect()
}

fn as_array<'v>(value: &'v Value, what: &'static str) -> Result<&'v [Value], FormatError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| FormatError::malformed(what, "expected an array"))
}

fn as_index(value: &Value, what: &'static str) -> Result<usize, FormatError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| FormatError::malformed(what, "expected a non-negative integer"))
}

fn field<'v>(entry: &'v [Value], index: usize, what: &'static str) -> Result<&'v Value, FormatError> {
    entry
        .get(index)
        .ok_or_else(|| FormatError::malformed(what, "missing"))
}

fn string_field(entry: &[Value], index: usize, what: &'static str) -> Result<String, FormatError> {
    field(entry, index, what)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| FormatError::malformed(what, "expected a string"))
}

use indexmap::IndexSet;

use crate::error::InvariantViolation;
use crate::format::{MOBILEDOC_VERSION, MarkerData, MarkerType, Mobiledoc, SectionData};
use crate::models::{ContainerKey, Markup, Post, SectionKind};

type Result<T> = std::result::Result<T, InvariantViolation>;

/// Marker types seen so far in one render, in first-use order.
#[derive(Debug, Default)]
struct MarkerTypeTable {
    entries: IndexSet<(String, Vec<(String, String)>)>,
}

impl MarkerTypeTable {
    fn index_of(&mut self, markup: &Markup) -> usize {
        self.entries.insert_full(markup.intern_key()).0
    }

    fn into_marker_types(self) -> Vec<MarkerType> {
        self.entries
            .into_iter()
            .map(|(tag_name, attributes)| {
                MarkerType(
                    tag_name,
                    attributes.into_iter().flat_map(|(k, v)| [k, v]).collect(),
                )
            })
            .collect()
    }
}

/// Serialise a post to the wire format.
///
/// Each distinct markup gets one entry in the marker type table, the first
/// time a marker opens it. A marker records the indexes of the markups it
/// opens relative to its predecessor and how many it closes before its
/// successor.
pub fn render_mobiledoc(post: &Post) -> Result<Mobiledoc> {
    let mut table = MarkerTypeTable::default();
    let mut sections = Vec::with_capacity(post.sections().len());

    for key in post.section_keys() {
        let section = post.section(key).ok_or(InvariantViolation::UnknownItem)?;
        let data = match section.kind() {
            SectionKind::Markup(markup) => SectionData::Markup {
                tag_name: markup.tag_name().to_string(),
                markers: render_markers(post, ContainerKey::Section(key), &mut table)?,
            },
            SectionKind::List(list) => {
                let items = post
                    .list_items(key)?
                    .into_iter()
                    .map(|item| render_markers(post, ContainerKey::ListItem(item), &mut table))
                    .collect::<Result<Vec<_>>>()?;
                SectionData::List {
                    tag_name: list.tag_name().to_string(),
                    items,
                }
            }
            SectionKind::Image(image) => SectionData::Image {
                src: image.src().map(str::to_string),
            },
            SectionKind::Card(card) => SectionData::Card {
                name: card.name().to_string(),
                payload: card.payload().clone(),
            },
        };
        sections.push(data);
    }

    let marker_types = table.into_marker_types();
    log::debug!(
        "rendered mobiledoc: {} sections, {} marker types",
        sections.len(),
        marker_types.len()
    );
    Ok(Mobiledoc {
        version: MOBILEDOC_VERSION.to_string(),
        sections: (marker_types, sections),
    })
}

fn render_markers(
    post: &Post,
    container: ContainerKey,
    table: &mut MarkerTypeTable,
) -> Result<Vec<MarkerData>> {
    post.markers(container)?
        .into_iter()
        .map(|key| {
            let marker = post.marker(key).ok_or(InvariantViolation::UnknownItem)?;
            let opened = post
                .opened_markups(key)?
                .iter()
                .map(|markup| table.index_of(markup))
                .collect();
            let closed = post.closed_markup_count(key)?;
            Ok(MarkerData(opened, closed, marker.value().to_string()))
        })
        .collect()
}

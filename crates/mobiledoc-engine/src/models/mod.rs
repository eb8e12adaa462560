/*!
 * # Document Model
 *
 * A [`Post`] is an ordered list of sections. Markup sections and list
 * items hold an ordered list of [`Marker`]s; each marker carries the
 * [`Markup`]s open around it, outermost first. Nesting is never stored as
 * a tree: two neighbouring markers share a markup by holding the same
 * `Rc`, and where a markup opens or closes falls out of comparing the
 * stacks of neighbours.
 *
 * All entities live in arenas owned by the post and are addressed by
 * slotmap keys. Only the [`Builder`] creates them.
 */

pub mod builder;
pub mod marker;
pub mod markup;
pub mod post;
pub mod section;

pub use builder::Builder;
pub use marker::Marker;
pub use markup::Markup;
pub use post::Post;
pub use section::{
    CardSection, ImageSection, ListItem, ListSection, MarkupSection, Section, SectionKind,
};

slotmap::new_key_type! {
    pub struct SectionKey;
    pub struct ListItemKey;
    pub struct MarkerKey;
}

/// Anything that holds markers: a markup section or a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKey {
    Section(SectionKey),
    ListItem(ListItemKey),
}

use std::rc::Rc;

use crate::models::{ContainerKey, MarkerKey, Markup};
use crate::utils::linked_list::{LinkedItem, Links, OwnedItem};

/// A run of text with the markups open around it, outermost first.
///
/// How many of those markups close after this marker is not stored: it
/// depends on the following marker and is derived by
/// [`Post::closed_markup_count`](crate::models::Post::closed_markup_count).
#[derive(Debug, Clone)]
pub struct Marker {
    value: String,
    markups: Vec<Rc<Markup>>,
    parent: Option<ContainerKey>,
    links: Links<MarkerKey>,
}

impl Marker {
    pub(crate) fn new(value: String, markups: Vec<Rc<Markup>>) -> Self {
        Self {
            value,
            markups,
            parent: None,
            links: Links::default(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn markups(&self) -> &[Rc<Markup>] {
        &self.markups
    }

    pub fn set_markups(&mut self, markups: Vec<Rc<Markup>>) {
        self.markups = markups;
    }

    pub fn has_markup(&self, tag_name: &str) -> bool {
        self.markups.iter().any(|m| m.has_tag(tag_name))
    }

    /// The marker list this marker is linked into, if any.
    pub fn parent(&self) -> Option<ContainerKey> {
        self.parent
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn links(&self) -> &Links<MarkerKey> {
        &self.links
    }
}

impl LinkedItem<MarkerKey> for Marker {
    fn links(&self) -> &Links<MarkerKey> {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links<MarkerKey> {
        &mut self.links
    }
}

impl OwnedItem<ContainerKey> for Marker {
    fn set_owner(&mut self, owner: Option<ContainerKey>) {
        self.parent = owner;
    }
}

/// Length of the longest shared prefix of two open-markup stacks.
pub fn common_markup_prefix(a: &[Rc<Markup>], b: &[Rc<Markup>]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

use std::rc::Rc;

use slotmap::SlotMap;

use crate::error::InvariantViolation;
use crate::models::marker::common_markup_prefix;
use crate::models::{
    ContainerKey, ListItem, ListItemKey, Marker, MarkerKey, Markup, Section, SectionKey,
    SectionKind,
};
use crate::utils::linked_list::{LinkedList, OwnedStore};

type Result<T> = std::result::Result<T, InvariantViolation>;

type MarkerStore<'a> = OwnedStore<'a, MarkerKey, Marker, ContainerKey>;
type ItemStore<'a> = OwnedStore<'a, ListItemKey, ListItem, SectionKey>;

/// Document root.
///
/// A post owns three arenas (sections, list items, markers) and the
/// ordered list of its top-level sections. Entities are created into the
/// arenas by the [`Builder`](crate::models::Builder) and only become part
/// of the document once linked into a list. Removing an entity unlinks it
/// but keeps it in its arena so it can be re-inserted; `discard_*` drops
/// it for good.
#[derive(Debug, Clone, Default)]
pub struct Post {
    sections: LinkedList<SectionKey>,
    section_store: SlotMap<SectionKey, Section>,
    item_store: SlotMap<ListItemKey, ListItem>,
    marker_store: SlotMap<MarkerKey, Marker>,
}

impl Post {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // Arena access

    pub(crate) fn add_section(&mut self, section: Section) -> SectionKey {
        self.section_store.insert(section)
    }

    pub(crate) fn add_list_item(&mut self, item: ListItem) -> ListItemKey {
        self.item_store.insert(item)
    }

    pub(crate) fn add_marker(&mut self, marker: Marker) -> MarkerKey {
        self.marker_store.insert(marker)
    }

    pub fn section(&self, key: SectionKey) -> Option<&Section> {
        self.section_store.get(key)
    }

    pub fn list_item(&self, key: ListItemKey) -> Option<&ListItem> {
        self.item_store.get(key)
    }

    pub fn marker(&self, key: MarkerKey) -> Option<&Marker> {
        self.marker_store.get(key)
    }

    pub fn marker_mut(&mut self, key: MarkerKey) -> Option<&mut Marker> {
        self.marker_store.get_mut(key)
    }

    // Sections

    pub fn sections(&self) -> &LinkedList<SectionKey> {
        &self.sections
    }

    pub fn section_keys(&self) -> Vec<SectionKey> {
        self.sections.to_array(&self.section_store)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn append_section(&mut self, section: SectionKey) -> Result<()> {
        self.sections.append(&mut self.section_store, section)
    }

    pub fn prepend_section(&mut self, section: SectionKey) -> Result<()> {
        self.sections.prepend(&mut self.section_store, section)
    }

    pub fn insert_section_before(
        &mut self,
        section: SectionKey,
        reference: Option<SectionKey>,
    ) -> Result<()> {
        self.sections
            .insert_before(&mut self.section_store, section, reference)
    }

    pub fn insert_section_after(
        &mut self,
        section: SectionKey,
        reference: Option<SectionKey>,
    ) -> Result<()> {
        self.sections
            .insert_after(&mut self.section_store, section, reference)
    }

    pub fn remove_section(&mut self, section: SectionKey) -> Result<()> {
        self.sections.remove(&mut self.section_store, section)
    }

    /// Unlink a section if needed and drop it with everything it contains.
    pub fn discard_section(&mut self, section: SectionKey) -> Result<()> {
        let linked = self
            .section_store
            .get(section)
            .ok_or(InvariantViolation::UnknownItem)?
            .links()
            .is_linked();
        if linked {
            self.remove_section(section)?;
        }

        let Some(removed) = self.section_store.remove(section) else {
            return Err(InvariantViolation::UnknownItem);
        };
        match removed.kind() {
            SectionKind::Markup(s) => {
                for marker in s.markers.to_array(&self.marker_store) {
                    self.marker_store.remove(marker);
                }
            }
            SectionKind::List(s) => {
                for item in s.items.to_array(&self.item_store) {
                    self.drop_list_item(item);
                }
            }
            SectionKind::Image(_) | SectionKind::Card(_) => {}
        }
        Ok(())
    }

    // Markers

    pub fn markers(&self, container: ContainerKey) -> Result<Vec<MarkerKey>> {
        Ok(self.marker_list(container)?.to_array(&self.marker_store))
    }

    pub fn append_marker(&mut self, container: ContainerKey, marker: MarkerKey) -> Result<()> {
        self.insert_marker_before(container, marker, None)
    }

    /// Insert before `reference`; `None` appends.
    pub fn insert_marker_before(
        &mut self,
        container: ContainerKey,
        marker: MarkerKey,
        reference: Option<MarkerKey>,
    ) -> Result<()> {
        self.edit_markers(container, |list, store| {
            list.insert_before(store, marker, reference)
        })
    }

    /// Insert after `reference`; `None` prepends.
    pub fn insert_marker_after(
        &mut self,
        container: ContainerKey,
        marker: MarkerKey,
        reference: Option<MarkerKey>,
    ) -> Result<()> {
        self.edit_markers(container, |list, store| {
            list.insert_after(store, marker, reference)
        })
    }

    /// Unlink a marker from whichever container holds it.
    pub fn remove_marker(&mut self, marker: MarkerKey) -> Result<()> {
        let container = self
            .marker_store
            .get(marker)
            .ok_or(InvariantViolation::UnknownItem)?
            .parent()
            .ok_or(InvariantViolation::NotLinked)?;
        self.edit_markers(container, |list, store| list.remove(store, marker))
    }

    pub fn discard_marker(&mut self, marker: MarkerKey) -> Result<()> {
        let linked = self
            .marker_store
            .get(marker)
            .ok_or(InvariantViolation::UnknownItem)?
            .parent()
            .is_some();
        if linked {
            self.remove_marker(marker)?;
        }
        self.marker_store.remove(marker);
        Ok(())
    }

    /// Drop every marker of `container` matching `predicate` in one pass,
    /// returning how many went.
    pub fn discard_markers_by<F>(&mut self, container: ContainerKey, mut predicate: F) -> Result<usize>
    where
        F: FnMut(&Marker) -> bool,
    {
        let removed = self.edit_markers(container, |list, store| {
            list.remove_by(store, |store, key| store.get(key).is_some_and(&mut predicate))
        })?;
        for &marker in &removed {
            self.marker_store.remove(marker);
        }
        Ok(removed.len())
    }

    // List items

    pub fn list_items(&self, section: SectionKey) -> Result<Vec<ListItemKey>> {
        Ok(self.item_list(section)?.to_array(&self.item_store))
    }

    pub fn append_list_item(&mut self, section: SectionKey, item: ListItemKey) -> Result<()> {
        self.insert_list_item_before(section, item, None)
    }

    pub fn insert_list_item_before(
        &mut self,
        section: SectionKey,
        item: ListItemKey,
        reference: Option<ListItemKey>,
    ) -> Result<()> {
        self.edit_items(section, |list, store| {
            list.insert_before(store, item, reference)
        })
    }

    pub fn insert_list_item_after(
        &mut self,
        section: SectionKey,
        item: ListItemKey,
        reference: Option<ListItemKey>,
    ) -> Result<()> {
        self.edit_items(section, |list, store| {
            list.insert_after(store, item, reference)
        })
    }

    pub fn remove_list_item(&mut self, item: ListItemKey) -> Result<()> {
        let section = self
            .item_store
            .get(item)
            .ok_or(InvariantViolation::UnknownItem)?
            .parent()
            .ok_or(InvariantViolation::NotLinked)?;
        self.edit_items(section, |list, store| list.remove(store, item))
    }

    pub fn discard_list_item(&mut self, item: ListItemKey) -> Result<()> {
        let linked = self
            .item_store
            .get(item)
            .ok_or(InvariantViolation::UnknownItem)?
            .parent()
            .is_some();
        if linked {
            self.remove_list_item(item)?;
        }
        self.drop_list_item(item);
        Ok(())
    }

    fn drop_list_item(&mut self, item: ListItemKey) {
        if let Some(removed) = self.item_store.remove(item) {
            for marker in removed.markers.to_array(&self.marker_store) {
                self.marker_store.remove(marker);
            }
        }
    }

    // Section behaviour shared across kinds

    /// Whether a section (or list item) has no visible content.
    ///
    /// Markup sections and list items are blank when every marker is
    /// empty, lists when they have no items, images when they have no
    /// source. Cards are never blank.
    pub fn is_blank(&self, container: ContainerKey) -> Result<bool> {
        if let ContainerKey::Section(key) = container {
            let section = self
                .section_store
                .get(key)
                .ok_or(InvariantViolation::UnknownItem)?;
            match section.kind() {
                SectionKind::List(list) => return Ok(list.items.is_empty()),
                SectionKind::Image(image) => return Ok(image.src().is_none()),
                SectionKind::Card(_) => return Ok(false),
                SectionKind::Markup(_) => {}
            }
        }
        let markers = self.marker_list(container)?;
        Ok(markers.every(&self.marker_store, |m| self.marker_store[m].is_empty()))
    }

    /// Move every child of `other` to the end of `target`.
    ///
    /// Both must be markup sections with the same tag, or lists with the
    /// same tag. `other` is left empty and wherever it was.
    pub fn join_sections(&mut self, target: SectionKey, other: SectionKey) -> Result<()> {
        let (target_kind, other_kind) = (
            self.section(target)
                .ok_or(InvariantViolation::UnknownItem)?
                .kind(),
            self.section(other)
                .ok_or(InvariantViolation::UnknownItem)?
                .kind(),
        );
        let (compatible, is_list) = match (target_kind, other_kind) {
            (SectionKind::Markup(a), SectionKind::Markup(b)) => (a.tag_name() == b.tag_name(), false),
            (SectionKind::List(a), SectionKind::List(b)) => (a.tag_name() == b.tag_name(), true),
            _ => (false, false),
        };
        if !compatible || target == other {
            return Err(InvariantViolation::IncompatibleJoin {
                target: target_kind.name(),
                other: other_kind.name(),
            });
        }

        if is_list {
            for item in self.list_items(other)? {
                self.remove_list_item(item)?;
                self.append_list_item(target, item)?;
            }
        } else {
            let (from, to) = (ContainerKey::Section(other), ContainerKey::Section(target));
            for marker in self.markers(from)? {
                self.remove_marker(marker)?;
                self.append_marker(to, marker)?;
            }
        }
        Ok(())
    }

    // Markup stack encoding

    /// How many of this marker's markups are not open at the next marker.
    ///
    /// The last marker of a container closes everything it has open.
    pub fn closed_markup_count(&self, marker: MarkerKey) -> Result<usize> {
        let current = self
            .marker_store
            .get(marker)
            .ok_or(InvariantViolation::UnknownItem)?;
        let next = current
            .links()
            .next()
            .and_then(|k| self.marker_store.get(k))
            .map(Marker::markups)
            .unwrap_or(&[]);
        Ok(current.markups().len() - common_markup_prefix(current.markups(), next))
    }

    /// The markups this marker opens relative to the previous marker.
    pub fn opened_markups(&self, marker: MarkerKey) -> Result<&[Rc<Markup>]> {
        let current = self
            .marker_store
            .get(marker)
            .ok_or(InvariantViolation::UnknownItem)?;
        let previous = current
            .links()
            .prev()
            .and_then(|k| self.marker_store.get(k))
            .map(Marker::markups)
            .unwrap_or(&[]);
        let shared = common_markup_prefix(current.markups(), previous);
        Ok(&current.markups()[shared..])
    }

    // Internal list plumbing. Lists are `Copy`, so edits work on a copy
    // that is written back once the arena borrow has ended.

    pub(crate) fn marker_list(&self, container: ContainerKey) -> Result<LinkedList<MarkerKey>> {
        match container {
            ContainerKey::Section(key) => match self.section_store.get(key).map(Section::kind) {
                Some(SectionKind::Markup(s)) => Ok(s.markers),
                Some(other) => Err(InvariantViolation::NotAMarkerContainer(other.name())),
                None => Err(InvariantViolation::UnknownItem),
            },
            ContainerKey::ListItem(key) => self
                .item_store
                .get(key)
                .map(|item| item.markers)
                .ok_or(InvariantViolation::UnknownItem),
        }
    }

    fn set_marker_list(&mut self, container: ContainerKey, list: LinkedList<MarkerKey>) {
        match container {
            ContainerKey::Section(key) => {
                if let Some(SectionKind::Markup(s)) =
                    self.section_store.get_mut(key).map(Section::kind_mut)
                {
                    s.markers = list;
                }
            }
            ContainerKey::ListItem(key) => {
                if let Some(item) = self.item_store.get_mut(key) {
                    item.markers = list;
                }
            }
        }
    }

    fn edit_markers<R, F>(&mut self, container: ContainerKey, f: F) -> Result<R>
    where
        F: FnOnce(&mut LinkedList<MarkerKey>, &mut MarkerStore<'_>) -> Result<R>,
    {
        let mut list = self.marker_list(container)?;
        let result = f(
            &mut list,
            &mut OwnedStore::new(&mut self.marker_store, container),
        );
        self.set_marker_list(container, list);
        result
    }

    fn item_list(&self, section: SectionKey) -> Result<LinkedList<ListItemKey>> {
        match self.section_store.get(section).map(Section::kind) {
            Some(SectionKind::List(s)) => Ok(s.items),
            Some(other) => Err(InvariantViolation::NotAListSection(other.name())),
            None => Err(InvariantViolation::UnknownItem),
        }
    }

    fn edit_items<R, F>(&mut self, section: SectionKey, f: F) -> Result<R>
    where
        F: FnOnce(&mut LinkedList<ListItemKey>, &mut ItemStore<'_>) -> Result<R>,
    {
        let mut list = self.item_list(section)?;
        let result = f(&mut list, &mut OwnedStore::new(&mut self.item_store, section));
        if let Some(SectionKind::List(s)) = self.section_store.get_mut(section).map(Section::kind_mut) {
            s.items = list;
        }
        result
    }
}

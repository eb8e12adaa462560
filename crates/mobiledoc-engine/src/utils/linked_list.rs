//! # Linked List
//!
//! Every ordered collection in the model (a post's sections, a section's
//! markers, a list's items, a render node's children) is a doubly-linked
//! list. The list itself only records `head`, `tail` and the length; each
//! item carries its own [`Links`] inside whatever arena owns it. That
//! split lets a section's marker list live in the section while the
//! markers live in the post's marker arena, and lets an item move between
//! lists without being copied.
//!
//! The list talks to item storage through [`LinkStore`]. Stores can hook
//! [`LinkStore::adopt_item`] and [`LinkStore::free_item`], which fire exactly
//! once per insertion and removal; [`OwnedStore`] uses them to maintain a
//! back-reference from each item to the container that owns it.
//!
//! An item that is still linked (into this list or any other) cannot be
//! inserted again; callers must remove it first. Each list carries a
//! [`ListId`] that its items record while linked, so an item from another
//! list is never mistaken for a member.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{Key, SlotMap};

use crate::error::InvariantViolation;

type Result<T> = std::result::Result<T, InvariantViolation>;

/// Identity of one list. Copies of a list share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(u64);

impl ListId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-item link state, stored inside the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Links<K> {
    prev: Option<K>,
    next: Option<K>,
    list: Option<ListId>,
}

impl<K> Default for Links<K> {
    fn default() -> Self {
        Self {
            prev: None,
            next: None,
            list: None,
        }
    }
}

impl<K: Copy> Links<K> {
    pub fn prev(&self) -> Option<K> {
        self.prev
    }

    pub fn next(&self) -> Option<K> {
        self.next
    }

    pub fn is_linked(&self) -> bool {
        self.list.is_some()
    }

    /// The list this item is linked into.
    pub fn list(&self) -> Option<ListId> {
        self.list
    }
}

/// Anything that stores its own [`Links`].
pub trait LinkedItem<K> {
    fn links(&self) -> &Links<K>;
    fn links_mut(&mut self) -> &mut Links<K>;
}

/// Items that keep a back-reference to the container owning them.
pub trait OwnedItem<P> {
    fn set_owner(&mut self, owner: Option<P>);
}

/// Storage the list reads and writes item links through.
pub trait LinkStore<K: Copy> {
    fn links(&self, item: K) -> Option<&Links<K>>;
    fn links_mut(&mut self, item: K) -> Option<&mut Links<K>>;

    /// Called once after `item` has been linked into the list.
    fn adopt_item(&mut self, _item: K) {}

    /// Called once after `item` has been unlinked from the list.
    fn free_item(&mut self, _item: K) {}
}

impl<K: Key, V: LinkedItem<K>> LinkStore<K> for SlotMap<K, V> {
    fn links(&self, item: K) -> Option<&Links<K>> {
        self.get(item).map(|v| v.links())
    }

    fn links_mut(&mut self, item: K) -> Option<&mut Links<K>> {
        self.get_mut(item).map(|v| v.links_mut())
    }
}

/// A [`LinkStore`] over an arena whose adopt/free hooks set and clear the
/// owner back-reference of each item.
pub struct OwnedStore<'a, K: Key, V, P> {
    items: &'a mut SlotMap<K, V>,
    owner: P,
}

impl<'a, K: Key, V, P> OwnedStore<'a, K, V, P> {
    pub fn new(items: &'a mut SlotMap<K, V>, owner: P) -> Self {
        Self { items, owner }
    }

    pub fn get(&self, item: K) -> Option<&V> {
        self.items.get(item)
    }
}

impl<K, V, P> LinkStore<K> for OwnedStore<'_, K, V, P>
where
    K: Key,
    V: LinkedItem<K> + OwnedItem<P>,
    P: Copy,
{
    fn links(&self, item: K) -> Option<&Links<K>> {
        self.items.get(item).map(|v| v.links())
    }

    fn links_mut(&mut self, item: K) -> Option<&mut Links<K>> {
        self.items.get_mut(item).map(|v| v.links_mut())
    }

    fn adopt_item(&mut self, item: K) {
        if let Some(v) = self.items.get_mut(item) {
            v.set_owner(Some(self.owner));
        }
    }

    fn free_item(&mut self, item: K) {
        if let Some(v) = self.items.get_mut(item) {
            v.set_owner(None);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedList<K> {
    id: ListId,
    head: Option<K>,
    tail: Option<K>,
    length: usize,
}

impl<K> Default for LinkedList<K> {
    fn default() -> Self {
        Self {
            id: ListId::fresh(),
            head: None,
            tail: None,
            length: 0,
        }
    }
}

impl<K: Copy + Eq + Debug> LinkedList<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    /// Whether `item` is currently linked into this list.
    pub fn contains<S: LinkStore<K>>(&self, store: &S, item: K) -> bool {
        store
            .links(item)
            .is_some_and(|links| links.list == Some(self.id))
    }

    pub fn head(&self) -> Option<K> {
        self.head
    }

    pub fn tail(&self) -> Option<K> {
        self.tail
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn append<S: LinkStore<K>>(&mut self, store: &mut S, item: K) -> Result<()> {
        self.insert_before(store, item, None)
    }

    pub fn prepend<S: LinkStore<K>>(&mut self, store: &mut S, item: K) -> Result<()> {
        self.insert_after(store, item, None)
    }

    /// Insert `item` before `reference`; a `None` reference appends.
    pub fn insert_before<S: LinkStore<K>>(
        &mut self,
        store: &mut S,
        item: K,
        reference: Option<K>,
    ) -> Result<()> {
        self.ensure_detached(store, item)?;
        let (prev, next) = match reference {
            Some(next) => (self.member_links(store, next)?.prev, Some(next)),
            None => (self.tail, None),
        };
        self.link(store, item, prev, next)
    }

    /// Insert `item` after `reference`; a `None` reference prepends.
    pub fn insert_after<S: LinkStore<K>>(
        &mut self,
        store: &mut S,
        item: K,
        reference: Option<K>,
    ) -> Result<()> {
        self.ensure_detached(store, item)?;
        let (prev, next) = match reference {
            Some(prev) => (Some(prev), self.member_links(store, prev)?.next),
            None => (None, self.head),
        };
        self.link(store, item, prev, next)
    }

    pub fn remove<S: LinkStore<K>>(&mut self, store: &mut S, item: K) -> Result<()> {
        let links = *self.member_links(store, item)?;

        match links.prev {
            Some(prev) => set_next(store, prev, links.next)?,
            None => self.head = links.next,
        }
        match links.next {
            Some(next) => set_prev(store, next, links.prev)?,
            None => self.tail = links.prev,
        }

        *store.links_mut(item).ok_or(InvariantViolation::UnknownItem)? = Links::default();
        self.length -= 1;
        store.free_item(item);
        Ok(())
    }

    /// Remove every item matching `predicate`, returning them in list order.
    ///
    /// Survivors keep their relative order; the free hook fires once per
    /// removed item.
    pub fn remove_by<S, F>(&mut self, store: &mut S, mut predicate: F) -> Result<Vec<K>>
    where
        S: LinkStore<K>,
        F: FnMut(&S, K) -> bool,
    {
        let view: &S = store;
        let doomed: Vec<K> = self
            .iter(view)
            .filter(|&item| predicate(view, item))
            .collect();
        for &item in &doomed {
            self.remove(store, item)?;
        }
        Ok(doomed)
    }

    pub fn iter<'s, S: LinkStore<K>>(&self, store: &'s S) -> Iter<'s, K, S> {
        Iter {
            store,
            next: self.head,
        }
    }

    pub fn for_each<S: LinkStore<K>, F: FnMut(K, usize)>(&self, store: &S, mut f: F) {
        for (index, item) in self.iter(store).enumerate() {
            f(item, index);
        }
    }

    pub fn detect<S: LinkStore<K>, F: FnMut(K) -> bool>(
        &self,
        store: &S,
        mut predicate: F,
    ) -> Option<K> {
        self.iter(store).find(|&item| predicate(item))
    }

    pub fn every<S: LinkStore<K>, F: FnMut(K) -> bool>(&self, store: &S, mut predicate: F) -> bool {
        self.iter(store).all(|item| predicate(item))
    }

    pub fn object_at<S: LinkStore<K>>(&self, store: &S, index: usize) -> Option<K> {
        self.iter(store).nth(index)
    }

    pub fn to_array<S: LinkStore<K>>(&self, store: &S) -> Vec<K> {
        self.iter(store).collect()
    }

    /// Items from `from` to `to` inclusive; a `None` end reads to the tail.
    pub fn read_range<S: LinkStore<K>>(&self, store: &S, from: K, to: Option<K>) -> Vec<K> {
        let mut out = Vec::new();
        let mut cursor = Some(from);
        while let Some(item) = cursor {
            out.push(item);
            if Some(item) == to {
                break;
            }
            cursor = store.links(item).and_then(|l| l.next);
        }
        out
    }

    /// Remove `remove_count` items starting at `reference` and insert
    /// `items` in their place.
    ///
    /// Everything is validated before the list is touched, so a failing
    /// splice leaves the list unchanged. Items being removed may appear in
    /// `items`, which is how a run of children is reordered.
    pub fn splice<S: LinkStore<K>>(
        &mut self,
        store: &mut S,
        reference: K,
        remove_count: usize,
        items: &[K],
    ) -> Result<()> {
        self.member_links(store, reference)?;

        let mut doomed = Vec::with_capacity(remove_count);
        let mut cursor = Some(reference);
        while doomed.len() < remove_count {
            match cursor {
                Some(item) => {
                    doomed.push(item);
                    cursor = store.links(item).and_then(|l| l.next);
                }
                None => {
                    return Err(InvariantViolation::SpliceOutOfRange {
                        requested: remove_count,
                        available: doomed.len(),
                    });
                }
            }
        }
        let anchor = if remove_count == 0 {
            Some(reference)
        } else {
            cursor
        };

        for (i, item) in items.iter().enumerate() {
            if items[..i].contains(item) {
                return Err(InvariantViolation::DuplicateSpliceItem);
            }
            if Some(*item) == anchor {
                return Err(InvariantViolation::AlreadyLinked);
            }
            let links = store.links(*item).ok_or(InvariantViolation::UnknownItem)?;
            if links.is_linked() && !doomed.contains(item) {
                return Err(InvariantViolation::AlreadyLinked);
            }
        }

        for &item in &doomed {
            self.remove(store, item)?;
        }
        for &item in items {
            self.insert_before(store, item, anchor)?;
        }
        Ok(())
    }

    fn ensure_detached<S: LinkStore<K>>(&self, store: &S, item: K) -> Result<()> {
        let links = store.links(item).ok_or(InvariantViolation::UnknownItem)?;
        if links.is_linked() {
            return Err(InvariantViolation::AlreadyLinked);
        }
        Ok(())
    }

    /// Links of an item that must currently be linked into this list.
    fn member_links<'s, S: LinkStore<K>>(&self, store: &'s S, item: K) -> Result<&'s Links<K>> {
        let links = store.links(item).ok_or(InvariantViolation::UnknownItem)?;
        if links.list != Some(self.id) {
            return Err(InvariantViolation::NotLinked);
        }
        Ok(links)
    }

    fn link<S: LinkStore<K>>(
        &mut self,
        store: &mut S,
        item: K,
        prev: Option<K>,
        next: Option<K>,
    ) -> Result<()> {
        *store.links_mut(item).ok_or(InvariantViolation::UnknownItem)? = Links {
            prev,
            next,
            list: Some(self.id),
        };
        match prev {
            Some(prev) => set_next(store, prev, Some(item))?,
            None => self.head = Some(item),
        }
        match next {
            Some(next) => set_prev(store, next, Some(item))?,
            None => self.tail = Some(item),
        }
        self.length += 1;
        store.adopt_item(item);
        Ok(())
    }
}

fn set_next<K: Copy, S: LinkStore<K>>(store: &mut S, item: K, next: Option<K>) -> Result<()> {
    store
        .links_mut(item)
        .ok_or(InvariantViolation::UnknownItem)?
        .next = next;
    Ok(())
}

fn set_prev<K: Copy, S: LinkStore<K>>(store: &mut S, item: K, prev: Option<K>) -> Result<()> {
    store
        .links_mut(item)
        .ok_or(InvariantViolation::UnknownItem)?
        .prev = prev;
    Ok(())
}

pub struct Iter<'s, K, S> {
    store: &'s S,
    next: Option<K>,
}

impl<K: Copy, S: LinkStore<K>> Iterator for Iter<'_, K, S> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let item = self.next?;
        self.next = self.store.links(item).and_then(|l| l.next);
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    slotmap::new_key_type! { struct ItemKey; }

    #[derive(Debug, Default)]
    struct Item {
        name: &'static str,
        should_remove: bool,
        links: Links<ItemKey>,
    }

    impl LinkedItem<ItemKey> for Item {
        fn links(&self) -> &Links<ItemKey> {
            &self.links
        }

        fn links_mut(&mut self) -> &mut Links<ItemKey> {
            &mut self.links
        }
    }

    /// Store that records hook calls.
    #[derive(Default)]
    struct Recording {
        items: SlotMap<ItemKey, Item>,
        adopted: Vec<ItemKey>,
        freed: Vec<ItemKey>,
    }

    impl Recording {
        fn item(&mut self, name: &'static str) -> ItemKey {
            self.items.insert(Item {
                name,
                ..Item::default()
            })
        }

        fn names(&self, list: &LinkedList<ItemKey>) -> Vec<&'static str> {
            list.iter(self).map(|k| self.items[k].name).collect()
        }
    }

    impl LinkStore<ItemKey> for Recording {
        fn links(&self, item: ItemKey) -> Option<&Links<ItemKey>> {
            self.items.links(item)
        }

        fn links_mut(&mut self, item: ItemKey) -> Option<&mut Links<ItemKey>> {
            self.items.links_mut(item)
        }

        fn adopt_item(&mut self, item: ItemKey) {
            self.adopted.push(item);
        }

        fn free_item(&mut self, item: ItemKey) {
            self.freed.push(item);
        }
    }

    fn list_of(store: &mut Recording, names: &[&'static str]) -> (LinkedList<ItemKey>, Vec<ItemKey>) {
        let mut list = LinkedList::new();
        let keys: Vec<_> = names.iter().map(|n| store.item(n)).collect();
        for &k in &keys {
            list.append(store, k).unwrap();
        }
        (list, keys)
    }

    #[test]
    fn initial_state() {
        let list: LinkedList<ItemKey> = LinkedList::new();
        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
    }

    #[rstest]
    #[case::append("append")]
    #[case::prepend("prepend")]
    #[case::insert_before("insert_before")]
    #[case::insert_after("insert_after")]
    fn inserting_the_initial_item(#[case] method: &str) {
        let mut store = Recording::default();
        let mut list = LinkedList::new();
        let item = store.item("one");

        match method {
            "append" => list.append(&mut store, item),
            "prepend" => list.prepend(&mut store, item),
            "insert_before" => list.insert_before(&mut store, item, None),
            _ => list.insert_after(&mut store, item, None),
        }
        .unwrap();

        assert_eq!(list.len(), 1);
        assert!(!list.is_empty());
        assert_eq!(list.head(), Some(item));
        assert_eq!(list.tail(), Some(item));
        assert_eq!(store.items[item].links.prev(), None);
        assert_eq!(store.items[item].links.next(), None);
        assert_eq!(store.adopted, vec![item]);
    }

    #[test]
    fn append_links_second_item() {
        let mut store = Recording::default();
        let (list, keys) = list_of(&mut store, &["one", "two"]);

        assert_eq!(list.len(), 2);
        assert_eq!(list.head(), Some(keys[0]));
        assert_eq!(list.tail(), Some(keys[1]));
        assert_eq!(store.items[keys[0]].links.prev(), None);
        assert_eq!(store.items[keys[0]].links.next(), Some(keys[1]));
        assert_eq!(store.items[keys[1]].links.prev(), Some(keys[0]));
        assert_eq!(store.items[keys[1]].links.next(), None);
    }

    #[test]
    fn prepend_links_first_item() {
        let mut store = Recording::default();
        let mut list = LinkedList::new();
        let one = store.item("one");
        let two = store.item("two");
        list.prepend(&mut store, two).unwrap();
        list.prepend(&mut store, one).unwrap();

        assert_eq!(store.names(&list), vec!["one", "two"]);
        assert_eq!(list.head(), Some(one));
        assert_eq!(list.tail(), Some(two));
    }

    #[test]
    fn insert_before_and_after_middle_items() {
        let mut store = Recording::default();
        let (mut list, keys) = list_of(&mut store, &["one", "four"]);
        let two = store.item("two");
        let three = store.item("three");

        list.insert_before(&mut store, three, Some(keys[1])).unwrap();
        list.insert_after(&mut store, two, Some(keys[0])).unwrap();

        assert_eq!(store.names(&list), vec!["one", "two", "three", "four"]);
        assert_eq!(store.items[two].links.prev(), Some(keys[0]));
        assert_eq!(store.items[two].links.next(), Some(three));
        assert_eq!(store.items[three].links.next(), Some(keys[1]));
    }

    #[test]
    fn none_reference_appends_or_prepends() {
        let mut store = Recording::default();
        let (mut list, _) = list_of(&mut store, &["one"]);
        let before = store.item("appended");
        let after = store.item("prepended");

        list.insert_before(&mut store, before, None).unwrap();
        list.insert_after(&mut store, after, None).unwrap();

        assert_eq!(store.names(&list), vec!["prepended", "one", "appended"]);
    }

    #[rstest]
    #[case::only(&["one"], 0, &[])]
    #[case::first(&["one", "two"], 0, &["two"])]
    #[case::last(&["one", "two"], 1, &["one"])]
    #[case::middle(&["one", "two", "three"], 1, &["one", "three"])]
    fn remove_relinks_neighbours(
        #[case] names: &[&'static str],
        #[case] index: usize,
        #[case] expected: &[&'static str],
    ) {
        let mut store = Recording::default();
        let (mut list, keys) = list_of(&mut store, names);

        list.remove(&mut store, keys[index]).unwrap();

        assert_eq!(store.names(&list), expected.to_vec());
        assert_eq!(list.len(), expected.len());
        assert_eq!(store.items[keys[index]].links, Links::default());
        assert_eq!(store.freed, vec![keys[index]]);
        if let Some(head) = list.head() {
            assert_eq!(store.items[head].links.prev(), None);
        }
        if let Some(tail) = list.tail() {
            assert_eq!(store.items[tail].links.next(), None);
        }
    }

    #[test]
    fn for_each_passes_indexes() {
        let mut store = Recording::default();
        let (list, keys) = list_of(&mut store, &["one", "two", "three"]);
        let mut seen = Vec::new();

        list.for_each(&store, |item, index| seen.push((item, index)));

        assert_eq!(seen, vec![(keys[0], 0), (keys[1], 1), (keys[2], 2)]);
    }

    #[test]
    fn read_range_walks_inclusive() {
        let mut store = Recording::default();
        let (list, k) = list_of(&mut store, &["one", "two", "three"]);

        assert_eq!(list.read_range(&store, k[0], Some(k[0])), vec![k[0]]);
        assert_eq!(list.read_range(&store, k[1], Some(k[2])), vec![k[1], k[2]]);
        assert_eq!(list.read_range(&store, k[0], Some(k[1])), vec![k[0], k[1]]);
        assert_eq!(list.read_range(&store, k[0], None), k);
    }

    #[test]
    fn detect_object_at_and_every() {
        let mut store = Recording::default();
        let (list, k) = list_of(&mut store, &["one", "two", "three"]);

        assert_eq!(list.detect(&store, |i| i == k[1]), Some(k[1]));
        assert_eq!(list.detect(&store, |_| false), None);
        assert_eq!(list.object_at(&store, 2), Some(k[2]));
        assert_eq!(list.object_at(&store, 3), None);
        assert!(list.every(&store, |i| !store.items[i].name.is_empty()));
        assert!(!list.every(&store, |i| store.items[i].name.len() == 3));
    }

    #[test]
    fn splice_replaces_target() {
        let mut store = Recording::default();
        let (mut list, k) = list_of(&mut store, &["one", "three"]);
        let two = store.item("two");

        list.splice(&mut store, k[0], 1, &[two]).unwrap();

        assert_eq!(store.names(&list), vec!["two", "three"]);
    }

    #[test]
    fn splice_with_nothing_to_do() {
        let mut store = Recording::default();
        let (mut list, k) = list_of(&mut store, &["one", "two"]);

        list.splice(&mut store, k[1], 0, &[]).unwrap();

        assert_eq!(store.names(&list), vec!["one", "two"]);
    }

    #[test]
    fn splice_can_reorganize_items() {
        let mut store = Recording::default();
        let (mut list, k) = list_of(&mut store, &["one", "two", "three"]);

        list.splice(&mut store, k[0], 3, &[k[2], k[0], k[1]]).unwrap();

        assert_eq!(store.names(&list), vec!["three", "one", "two"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn failed_splice_leaves_list_untouched() {
        let mut store = Recording::default();
        let (mut list, k) = list_of(&mut store, &["one", "two"]);

        let err = list.splice(&mut store, k[1], 2, &[]).unwrap_err();

        assert_eq!(
            err,
            InvariantViolation::SpliceOutOfRange {
                requested: 2,
                available: 1
            }
        );
        assert_eq!(store.names(&list), vec!["one", "two"]);
    }

    #[rstest]
    #[case::middle(&[1])]
    #[case::first(&[0])]
    #[case::last(&[3])]
    #[case::several(&[0, 2])]
    fn remove_by_keeps_survivor_order(#[case] doomed: &[usize]) {
        let mut store = Recording::default();
        let (mut list, k) = list_of(&mut store, &["a", "b", "c", "d"]);
        for &i in doomed {
            store.items[k[i]].should_remove = true;
        }

        let removed = list
            .remove_by(&mut store, |s, item| s.items[item].should_remove)
            .unwrap();

        let expected: Vec<_> = (0..4).filter(|i| !doomed.contains(i)).map(|i| k[i]).collect();
        assert_eq!(list.to_array(&store), expected);
        assert_eq!(list.len(), expected.len());
        let doomed_keys: Vec<_> = doomed.iter().map(|&i| k[i]).collect();
        assert_eq!(removed, doomed_keys);
        assert_eq!(store.freed, doomed_keys);
    }

    #[test]
    fn inserting_an_item_already_in_this_list_fails() {
        let mut store = Recording::default();
        let (mut list, k) = list_of(&mut store, &["one"]);

        assert_eq!(
            list.insert_before(&mut store, k[0], None),
            Err(InvariantViolation::AlreadyLinked)
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn inserting_an_item_from_another_list_fails() {
        let mut store = Recording::default();
        let (_first, k) = list_of(&mut store, &["one"]);
        let mut second = LinkedList::new();

        assert_eq!(
            second.insert_before(&mut store, k[0], None),
            Err(InvariantViolation::AlreadyLinked)
        );
        assert!(second.is_empty());
    }

    #[test]
    fn removed_items_can_be_reinserted() {
        let mut store = Recording::default();
        let (mut list, k) = list_of(&mut store, &["one", "two"]);

        list.remove(&mut store, k[0]).unwrap();
        list.append(&mut store, k[0]).unwrap();

        assert_eq!(store.names(&list), vec!["two", "one"]);
    }

    #[test]
    fn removing_a_foreign_item_fails() {
        let mut store = Recording::default();
        let (_first, k) = list_of(&mut store, &["one", "two"]);
        let mut second = LinkedList::new();
        let other = store.item("other");
        second.append(&mut store, other).unwrap();

        assert_eq!(
            second.remove(&mut store, k[0]),
            Err(InvariantViolation::NotLinked)
        );
    }

    #[rstest]
    #[case::head(0)]
    #[case::middle(1)]
    #[case::tail(2)]
    fn removing_an_item_of_another_list_leaves_both_intact(#[case] index: usize) {
        let mut store = Recording::default();
        let (first, k) = list_of(&mut store, &["a0", "a1", "a2"]);
        let (mut second, _) = list_of(&mut store, &["b0"]);

        assert_eq!(
            second.remove(&mut store, k[index]),
            Err(InvariantViolation::NotLinked)
        );
        assert_eq!(second.len(), 1);
        assert_eq!(store.names(&second), vec!["b0"]);
        assert_eq!(first.len(), 3);
        assert_eq!(store.names(&first), vec!["a0", "a1", "a2"]);
    }

    #[test]
    fn inserting_next_to_an_item_of_another_list_fails() {
        let mut store = Recording::default();
        let (first, k) = list_of(&mut store, &["a0", "a1", "a2"]);
        let (mut second, _) = list_of(&mut store, &["b0"]);
        let fresh = store.item("new");

        assert_eq!(
            second.insert_after(&mut store, fresh, Some(k[1])),
            Err(InvariantViolation::NotLinked)
        );
        assert_eq!(
            second.insert_before(&mut store, fresh, Some(k[1])),
            Err(InvariantViolation::NotLinked)
        );
        assert!(!store.items[fresh].links.is_linked());
        assert_eq!(second.len(), 1);
        assert_eq!(store.names(&first), vec!["a0", "a1", "a2"]);
    }

    #[test]
    fn contains_reports_membership() {
        let mut store = Recording::default();
        let (first, k) = list_of(&mut store, &["a0", "a1"]);
        let (second, b) = list_of(&mut store, &["b0"]);

        assert!(first.contains(&store, k[1]));
        assert!(!second.contains(&store, k[1]));
        assert!(second.contains(&store, b[0]));
        assert_eq!(store.items[k[0]].links.list(), Some(first.id()));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Append,
        Prepend,
        InsertBefore(usize),
        InsertAfter(usize),
        Remove(usize),
    }

    impl quickcheck::Arbitrary for Op {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let n = usize::arbitrary(g) % 8;
            match u8::arbitrary(g) % 5 {
                0 => Op::Append,
                1 => Op::Prepend,
                2 => Op::InsertBefore(n),
                3 => Op::InsertAfter(n),
                _ => Op::Remove(n),
            }
        }
    }

    use quickcheck::Arbitrary;

    quickcheck::quickcheck! {
        fn matches_a_vec_model(ops: Vec<Op>) -> bool {
            let mut store = Recording::default();
            let mut list = LinkedList::new();
            let mut model: Vec<ItemKey> = Vec::new();

            for op in ops {
                match op {
                    Op::Append => {
                        let item = store.item("x");
                        list.append(&mut store, item).unwrap();
                        model.push(item);
                    }
                    Op::Prepend => {
                        let item = store.item("x");
                        list.prepend(&mut store, item).unwrap();
                        model.insert(0, item);
                    }
                    Op::InsertBefore(i) if !model.is_empty() => {
                        let at = i % model.len();
                        let item = store.item("x");
                        list.insert_before(&mut store, item, Some(model[at])).unwrap();
                        model.insert(at, item);
                    }
                    Op::InsertAfter(i) if !model.is_empty() => {
                        let at = i % model.len();
                        let item = store.item("x");
                        list.insert_after(&mut store, item, Some(model[at])).unwrap();
                        model.insert(at + 1, item);
                    }
                    Op::Remove(i) if !model.is_empty() => {
                        let item = model.remove(i % model.len());
                        list.remove(&mut store, item).unwrap();
                    }
                    _ => {}
                }
            }

            let head_ok = list.head().is_none_or(|h| store.items[h].links.prev().is_none());
            let tail_ok = list.tail().is_none_or(|t| store.items[t].links.next().is_none());
            list.len() == model.len() && list.to_array(&store) == model && head_ok && tail_ok
        }
    }
}

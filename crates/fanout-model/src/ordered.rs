//! Insertion-ordered map.
//!
//! Entries live densely in a `Vec` in insertion order; a `hashbrown::HashTable` maps
//! key hashes to positions in that `Vec`. Removal shifts later entries down and
//! renumbers their positions, so relative order is always preserved.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use hashbrown::HashTable;

use crate::{Collectable, FnvBuildHasher};

type Entry<K, V> = (K, V);
type EntryRef<'a, K, V> = fn(&'a Entry<K, V>) -> (&'a K, &'a V);

fn entry_ref<K, V>((k, v): &Entry<K, V>) -> (&K, &V) {
    (k, v)
}

/// Map that iterates in the order keys were first inserted.
#[derive(Clone)]
pub struct OrderedMap<K, V, S = FnvBuildHasher> {
    entries: Vec<Entry<K, V>>,
    index: HashTable<usize>,
    hash_builder: S,
}

impl<K, V> OrderedMap<K, V, FnvBuildHasher> {
    pub fn new() -> Self {
        Self::with_hasher(FnvBuildHasher::default())
    }
}

impl<K, V, S> OrderedMap<K, V, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            entries: Vec::new(),
            index: HashTable::new(),
            hash_builder,
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at insertion position `index`.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|(k, v)| (k, v))
    }

    pub fn iter(&self) -> std::iter::Map<std::slice::Iter<'_, Entry<K, V>>, EntryRef<'_, K, V>> {
        self.entries.iter().map(entry_ref as EntryRef<'_, K, V>)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Consumes the map into its entries, in order.
    pub fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

impl<K, V, S> OrderedMap<K, V, S>
where
    K: Collectable,
    S: BuildHasher,
{
    /// Inserts `value` under `key`.
    ///
    /// A new key is appended at the end. An existing key keeps its position and the
    /// previous value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        let entries = &mut self.entries;
        if let Some(&pos) = self.index.find(hash, |&i| entries[i].0 == key) {
            return Some(std::mem::replace(&mut entries[pos].1, value));
        }

        let pos = entries.len();
        entries.push((key, value));
        let hash_builder = &self.hash_builder;
        self.index
            .insert_unique(hash, pos, |&i| hash_builder.hash_one(&entries[i].0));
        None
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.position(key).map(|pos| &self.entries[pos].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.position(key).is_some()
    }

    /// Removes `key`, shifting every later entry one position down.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.entries.is_empty() {
            return None;
        }
        let hash = self.hash_builder.hash_one(key);
        let entries = &self.entries;
        let pos = match self
            .index
            .find_entry(hash, |&i| Borrow::<Q>::borrow(&entries[i].0) == key)
        {
            Ok(found) => found.remove().0,
            Err(_) => return None,
        };

        let (_, value) = self.entries.remove(pos);
        for slot in self.index.iter_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(value)
    }

    fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.entries.is_empty() {
            return None;
        }
        let hash = self.hash_builder.hash_one(key);
        self.index
            .find(hash, |&i| Borrow::<Q>::borrow(&self.entries[i].0) == key)
            .copied()
    }
}

impl<K, V> Default for OrderedMap<K, V, FnvBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for OrderedMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equal when both maps hold equal entries in the same order.
impl<K: PartialEq, V: PartialEq, S> PartialEq for OrderedMap<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq, V: Eq, S> Eq for OrderedMap<K, V, S> {}

impl<K, V, S> IntoIterator for OrderedMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = std::iter::Map<std::slice::Iter<'a, Entry<K, V>>, EntryRef<'a, K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedMap<K, V, S>
where
    K: Collectable,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedMap<K, V, S>
where
    K: Collectable,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

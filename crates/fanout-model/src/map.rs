use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::{Collectable, FnvBuildHasher};

/// Hash map keyed by [`Collectable`] values.
///
/// Inserting under an existing key replaces the value: the last writer wins.
#[derive(Clone)]
pub struct Map<K, V, S = FnvBuildHasher> {
    inner: hashbrown::HashMap<K, V, S>,
}

impl<K, V> Map<K, V, FnvBuildHasher> {
    pub fn new() -> Self {
        Self::with_hasher(FnvBuildHasher::default())
    }
}

impl<K, V, S> Map<K, V, S> {
    /// Creates an empty map hashing keys through `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: hashbrown::HashMap::with_hasher(hasher),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            inner: hashbrown::HashMap::with_capacity_and_hasher(capacity, hasher),
        }
    }

    pub fn hasher(&self) -> &S {
        self.inner.hasher()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> hashbrown::hash_map::Iter<'_, K, V> {
        self.inner.iter()
    }

    pub fn keys(&self) -> hashbrown::hash_map::Keys<'_, K, V> {
        self.inner.keys()
    }

    pub fn values(&self) -> hashbrown::hash_map::Values<'_, K, V> {
        self.inner.values()
    }
}

impl<K, V, S> Map<K, V, S>
where
    K: Collectable,
    S: BuildHasher,
{
    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(key)
    }
}

impl<K, V> Default for Map<K, V, FnvBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for Map<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.iter()).finish()
    }
}

impl<K, V, S> PartialEq for Map<K, V, S>
where
    K: Collectable,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K, V, S> Eq for Map<K, V, S>
where
    K: Collectable,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> IntoIterator for Map<K, V, S> {
    type Item = (K, V);
    type IntoIter = hashbrown::hash_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a Map<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = hashbrown::hash_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K, V, S> FromIterator<(K, V)> for Map<K, V, S>
where
    K: Collectable,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for Map<K, V, S>
where
    K: Collectable,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_writer_wins() {
        let mut map = Map::new();
        assert_eq!(map.insert("k", 1), None);
        assert_eq!(map.insert("k", 2), Some(1));
        assert_eq!(map.get("k"), Some(&2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn lookup_by_borrowed_key() {
        let map: Map<String, i32> = [("one".to_string(), 1)].into_iter().collect();
        assert!(map.contains_key("one"));
        assert_eq!(map.get("two"), None);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a: Map<i32, &str> = [(1, "a"), (2, "b")].into_iter().collect();
        let b: Map<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
        assert_eq!(a, b);
    }
}

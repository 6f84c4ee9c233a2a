use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::{Collectable, FnvBuildHasher};

/// Hash set of [`Collectable`] elements.
///
/// Inserting an element that is already present is a no-op, so merging several sets
/// into one is a union.
#[derive(Clone)]
pub struct Set<T, S = FnvBuildHasher> {
    inner: hashbrown::HashSet<T, S>,
}

impl<T> Set<T, FnvBuildHasher> {
    pub fn new() -> Self {
        Self::with_hasher(FnvBuildHasher::default())
    }
}

impl<T, S> Set<T, S> {
    /// Creates an empty set hashing through `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: hashbrown::HashSet::with_hasher(hasher),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            inner: hashbrown::HashSet::with_capacity_and_hasher(capacity, hasher),
        }
    }

    /// The hash function this set compares elements with.
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

    pub fn iter(&self) -> hashbrown::hash_set::Iter<'_, T> {
        self.inner.iter()
    }
}

impl<T, S> Set<T, S>
where
    T: Collectable,
    S: BuildHasher,
{
    /// Adds `value`; returns `false` if an equal element was already present.
    pub fn insert(&mut self, value: T) -> bool {
        self.inner.insert(value)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains(value)
    }

    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(value)
    }
}

impl<T> Default for Set<T, FnvBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, S> fmt::Debug for Set<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.iter()).finish()
    }
}

impl<T, S> PartialEq for Set<T, S>
where
    T: Collectable,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T, S> Eq for Set<T, S>
where
    T: Collectable,
    S: BuildHasher,
{
}

impl<T, S> IntoIterator for Set<T, S> {
    type Item = T;
    type IntoIter = hashbrown::hash_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, T, S> IntoIterator for &'a Set<T, S> {
    type Item = &'a T;
    type IntoIter = hashbrown::hash_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<T, S> FromIterator<T> for Set<T, S>
where
    T: Collectable,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<T, S> Extend<T> for Set<T, S>
where
    T: Collectable,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

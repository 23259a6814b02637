use crate::comparer::Comparer;
use hashbrown::raw::{RawIntoIter, RawIter, RawTable};
use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// Hash set holding the values of a key which has at least two distinct values.
///
/// The set does not own a comparer: equality and hashing are supplied by the
/// owning [`MultiValueMap`](crate::MultiValueMap) on every mutation or lookup,
/// so a promoted key costs one table and nothing more.
pub struct ValueSet<V> {
    table: RawTable<V>,
}

impl<V> ValueSet<V> {
    /// Creates an empty set with at least the specified capacity.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RawTable::with_capacity(capacity),
        }
    }

    /// Returns the number of values in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// An iterator visiting all values in arbitrary order. The iterator element type is `&'a V`.
    pub fn iter(&self) -> Iter<'_, V> {
        unsafe {
            Iter {
                iter: self.table.iter(),
                phantom: PhantomData,
            }
        }
    }

    /// Adds a value to the set. Returns whether the value was newly inserted.
    pub(crate) fn insert<C>(&mut self, value: V, comparer: &C) -> bool
    where
        C: Comparer<V>,
    {
        let hash = comparer.hash(&value);

        if self.table.find(hash, |x| comparer.equals(x, &value)).is_some() {
            return false;
        }

        self.table.insert(hash, value, |x| comparer.hash(x));
        true
    }

    /// Adds a value already known to differ from every member, under a hash computed
    /// by the caller. Never calls a comparer.
    ///
    /// Room for the value must already be reserved, so the table does not rehash.
    pub(crate) fn insert_distinct(&mut self, hash: u64, value: V) {
        debug_assert!(self.table.capacity() > self.table.len());

        self.table.insert(hash, value, |_| hash);
    }

    /// Returns `true` if the set contains a value equal to `value`.
    pub(crate) fn contains<C>(&self, value: &V, comparer: &C) -> bool
    where
        C: Comparer<V>,
    {
        let hash = comparer.hash(value);

        self.table.find(hash, |x| comparer.equals(x, value)).is_some()
    }
}

impl<V: Clone> Clone for ValueSet<V> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<V: Debug> Debug for ValueSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, V> IntoIterator for &'a ValueSet<V> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

impl<V> IntoIterator for ValueSet<V> {
    type Item = V;
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> IntoIter<V> {
        IntoIter {
            iter: self.table.into_iter(),
        }
    }
}

/// An iterator over the values of a `ValueSet`.
pub struct Iter<'a, V> {
    iter: RawIter<V>,
    phantom: PhantomData<&'a V>,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
            phantom: PhantomData,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.iter.next().map(|bucket| unsafe { bucket.as_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {
    fn len(&self) -> usize {
        self.iter.len()
    }
}

impl<V> FusedIterator for Iter<'_, V> {}

impl<V: Debug> Debug for Iter<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An owning iterator over the values of a `ValueSet`.
pub struct IntoIter<V> {
    iter: RawIntoIter<V>,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {
    fn len(&self) -> usize {
        self.iter.len()
    }
}

impl<V> FusedIterator for IntoIter<V> {}

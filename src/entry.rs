use crate::comparer::Comparer;
use crate::error::{Error, Result};
use crate::set::{self, ValueSet};
use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::{mem, option};
use tracing::{error, trace};

/// The values associated with one key of a [`MultiValueMap`](crate::MultiValueMap).
///
/// A key starts out as [`Entry::Single`] and is promoted to [`Entry::Multi`] the
/// first time it receives a second distinct value. A `Multi` entry always holds at
/// least two values and never turns back into a `Single` one.
#[derive(Clone)]
pub enum Entry<V> {
    /// Exactly one value, stored inline.
    Single(V),
    /// Two or more distinct values.
    Multi(ValueSet<V>),
}

impl<V> Entry<V> {
    /// Returns the number of values in the entry: 1 for `Single`, at least 2 for `Multi`.
    pub fn len(&self) -> usize {
        match self {
            Entry::Single(_) => 1,
            Entry::Multi(set) => set.len(),
        }
    }

    /// Always `false`: an entry holds at least one value.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if the entry has been promoted to a value set.
    pub fn is_multi(&self) -> bool {
        matches!(self, Entry::Multi(_))
    }

    /// Returns one of the values. Which member of a `Multi` entry is returned is unspecified.
    pub fn any(&self) -> Option<&V> {
        self.iter().next()
    }

    /// An iterator visiting the values of the entry in arbitrary order.
    pub fn iter(&self) -> Iter<'_, V> {
        let inner = match self {
            Entry::Single(value) => IterInner::Single(Some(value).into_iter()),
            Entry::Multi(set) => IterInner::Multi(set.iter()),
        };

        Iter { inner }
    }

    /// Returns `true` if the entry holds a value equal to `value` under `comparer`.
    pub(crate) fn contains<C>(&self, value: &V, comparer: &C) -> bool
    where
        C: Comparer<V>,
    {
        match self {
            Entry::Single(existing) => comparer.equals(existing, value),
            Entry::Multi(set) => set.contains(value, comparer),
        }
    }

    /// Adds a value to the entry, promoting a `Single` entry on its second distinct value.
    ///
    /// Returns whether the value was newly added. On an invariant violation, or if the
    /// comparer panics, the entry is left as the `Single` it was before.
    pub(crate) fn insert<C>(&mut self, value: V, comparer: &C) -> Result<bool>
    where
        C: Comparer<V>,
    {
        match self {
            Entry::Multi(set) => Ok(set.insert(value, comparer)),
            Entry::Single(existing) if comparer.equals(existing, &value) => Ok(false),
            Entry::Single(_) => self.promote(value, comparer).map(|()| true),
        }
    }

    fn promote<C>(&mut self, value: V, comparer: &C) -> Result<()>
    where
        C: Comparer<V>,
    {
        let existing = match self {
            Entry::Single(existing) => existing,
            Entry::Multi(_) => unreachable!("only single entries are promoted"),
        };

        // All comparer calls happen while the slot still holds the single value.
        let mut set = ValueSet::with_capacity(2);
        set.insert(value, comparer);
        if set.contains(existing, comparer) {
            error!("value comparer disagreed with itself while promoting an entry");

            return Err(Error::InvariantViolation {
                expected: 2,
                actual: 1,
            });
        }
        let hash = comparer.hash(existing);

        let existing = match mem::replace(self, Entry::Multi(ValueSet::with_capacity(0))) {
            Entry::Single(existing) => existing,
            Entry::Multi(_) => unreachable!("only single entries are promoted"),
        };
        set.insert_distinct(hash, existing);

        trace!("promoted entry to a value set");
        *self = Entry::Multi(set);
        Ok(())
    }
}

impl<V: Debug> Debug for Entry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Single(value) => f.debug_tuple("Single").field(value).finish(),
            Entry::Multi(set) => f.debug_tuple("Multi").field(set).finish(),
        }
    }
}

impl<'a, V> IntoIterator for &'a Entry<V> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

/// An iterator over the values of an `Entry`.
pub struct Iter<'a, V> {
    inner: IterInner<'a, V>,
}

enum IterInner<'a, V> {
    Single(option::IntoIter<&'a V>),
    Multi(set::Iter<'a, V>),
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            IterInner::Single(iter) => IterInner::Single(iter.clone()),
            IterInner::Multi(iter) => IterInner::Multi(iter.clone()),
        };

        Self { inner }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        match &mut self.inner {
            IterInner::Single(iter) => iter.next(),
            IterInner::Multi(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Single(iter) => iter.size_hint(),
            IterInner::Multi(iter) => iter.size_hint(),
        }
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

impl<V: Debug> Debug for Iter<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

use crate::comparer::{Comparer, DefaultComparer};
use crate::entry::{self, Entry};
use crate::error::{Error, Result};
use hashbrown::raw::{RawIter, RawTable};
use hashbrown::TryReserveError;
use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use tracing::debug;

/// Multimap exposed as a collection of unique key-value pairs.
///
/// A key with one value stores it inline; the first time a key receives a second
/// distinct value it is promoted to a [`ValueSet`](crate::ValueSet). Keys are
/// identified by the key comparer `KC` and values within a key are deduplicated by
/// the value comparer `VC`.
///
/// The map is not thread-safe and never removes a key implicitly: once inserted, a key
/// stays until [`clear`](Self::clear) is called.
///
/// # Examples
///
/// ```
/// use multivalue_map::MultiValueMap;
///
/// let mut map = MultiValueMap::new();
/// map.insert(1, "a");
/// map.insert(1, "b");
/// map.insert(1, "b"); // Duplicate pairs are ignored.
/// map.insert(2, "c");
///
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.count_of(&1), 2);
/// ```
pub struct MultiValueMap<K, V, KC = DefaultComparer, VC = DefaultComparer> {
    key_comparer: KC,
    value_comparer: VC,
    table: RawTable<(K, Entry<V>)>,
    len: usize,
}

impl<K, V> MultiValueMap<K, V, DefaultComparer, DefaultComparer> {
    /// Creates an empty `MultiValueMap` with a capacity of 0, using the default comparers.
    ///
    /// # Examples
    ///
    /// ```
    /// use multivalue_map::MultiValueMap;
    ///
    /// let map: MultiValueMap<i32, i32> = MultiValueMap::new();
    ///
    /// assert_eq!(map.capacity(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparers(DefaultComparer::new(), DefaultComparer::new())
    }

    /// Creates an empty `MultiValueMap` with room for at least the specified number of keys.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparers(
            capacity,
            DefaultComparer::new(),
            DefaultComparer::new(),
        )
    }
}

impl<K, V, KC> MultiValueMap<K, V, KC, DefaultComparer> {
    /// Creates an empty `MultiValueMap` which identifies keys with `key_comparer`
    /// and compares values with the default comparer.
    pub fn with_key_comparer(key_comparer: KC) -> Self {
        Self::with_comparers(key_comparer, DefaultComparer::new())
    }
}

impl<K, V, VC> MultiValueMap<K, V, DefaultComparer, VC> {
    /// Creates an empty `MultiValueMap` which identifies keys with the default comparer
    /// and compares values with `value_comparer`.
    pub fn with_value_comparer(value_comparer: VC) -> Self {
        Self::with_comparers(DefaultComparer::new(), value_comparer)
    }
}

impl<K, V, KC, VC> MultiValueMap<K, V, KC, VC> {
    /// Creates an empty `MultiValueMap` which will use the given comparers for keys and values.
    pub const fn with_comparers(key_comparer: KC, value_comparer: VC) -> Self {
        Self {
            key_comparer,
            value_comparer,
            table: RawTable::new(),
            len: 0,
        }
    }

    /// Creates an empty `MultiValueMap` with room for at least the specified number of keys,
    /// using the given comparers for keys and values.
    pub fn with_capacity_and_comparers(
        capacity: usize,
        key_comparer: KC,
        value_comparer: VC,
    ) -> Self {
        Self {
            key_comparer,
            value_comparer,
            table: RawTable::with_capacity(capacity),
            len: 0,
        }
    }

    /// Returns the number of keys the map can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns a reference to the map's key comparer.
    pub const fn key_comparer(&self) -> &KC {
        &self.key_comparer
    }

    /// Returns a reference to the map's value comparer.
    pub const fn value_comparer(&self) -> &VC {
        &self.value_comparer
    }

    /// Returns the number of key-value pairs in the map.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map contains no pairs.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of distinct keys in the map.
    pub fn key_count(&self) -> usize {
        self.table.len()
    }

    /// Clears the map, removing all keys and values. Keeps the allocated memory for reuse.
    pub fn clear(&mut self) {
        debug!(pairs = self.len, keys = self.table.len(), "clearing map");

        self.table.clear();
        self.len = 0;
    }

    /// An iterator visiting all key-value pairs in arbitrary order. The iterator element type is `(&'a K, &'a V)`.
    ///
    /// A key with several values is yielded once per value. Every call starts a fresh traversal.
    pub fn iter(&self) -> Iter<'_, K, V> {
        unsafe {
            Iter {
                entries: self.table.iter(),
                current: None,
                remaining: self.len,
                phantom: PhantomData,
            }
        }
    }

    /// An iterator visiting all distinct keys in arbitrary order. The iterator element type is `&'a K`.
    ///
    /// # Examples
    ///
    /// ```
    /// use multivalue_map::MultiValueMap;
    ///
    /// let mut map = MultiValueMap::new();
    /// map.insert(1, 1);
    /// map.insert(1, 2);
    /// map.insert(2, 3);
    ///
    /// let mut keys: Vec<_> = map.keys().collect();
    /// keys.sort_unstable(); // Sort since the keys are visited in arbitrary order.
    ///
    /// assert_eq!(keys, [&1, &2]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        unsafe {
            Keys {
                iter: self.table.iter(),
                phantom: PhantomData,
            }
        }
    }

    /// An iterator visiting the value of every pair in arbitrary order. The iterator element type is `&'a V`.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { iter: self.iter() }
    }

    /// Removing a single key-value pair is not supported.
    ///
    /// Always returns [`Error::Unsupported`], whatever the map holds.
    ///
    /// # Examples
    ///
    /// ```
    /// use multivalue_map::{Error, MultiValueMap};
    ///
    /// let mut map = MultiValueMap::new();
    /// map.insert(1, 1);
    ///
    /// assert_eq!(map.remove_pair(&1, &1), Err(Error::Unsupported("remove_pair")));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn remove_pair(&mut self, _key: &K, _value: &V) -> Result<bool> {
        Err(Error::Unsupported("remove_pair"))
    }
}

impl<K, V, KC, VC> MultiValueMap<K, V, KC, VC>
where
    KC: Comparer<K>,
    VC: Comparer<V>,
{
    /// Reserves capacity for at least `additional` more keys to be inserted in the `MultiValueMap`.
    pub fn reserve(&mut self, additional: usize) {
        let key_comparer = &self.key_comparer;

        self.table.reserve(additional, |x| key_comparer.hash(&x.0));
    }

    /// Tries to reserve capacity for at least `additional` more keys to be inserted in the `MultiValueMap`.
    pub fn try_reserve(&mut self, additional: usize) -> std::result::Result<(), TryReserveError> {
        let key_comparer = &self.key_comparer;

        self.table.try_reserve(additional, |x| key_comparer.hash(&x.0))
    }

    /// Shrinks the capacity of the map as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.shrink_to(0);
    }

    /// Shrinks the capacity of the map with a lower limit.
    pub fn shrink_to(&mut self, min_capacity: usize) {
        let key_comparer = &self.key_comparer;

        self.table.shrink_to(min_capacity, |x| key_comparer.hash(&x.0));
    }

    /// Inserts a key-value pair into the map. Returns whether the pair was newly added.
    ///
    /// Inserting a pair that is already present leaves the map unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the value comparer is inconsistent, so that promoting the key to a
    /// value set does not yield exactly two values. See [`try_insert`](Self::try_insert).
    pub fn insert(&mut self, key: K, value: V) -> bool {
        match self.try_insert(key, value) {
            Ok(inserted) => inserted,
            Err(err) => panic!("{err}"),
        }
    }

    /// Inserts a key-value pair into the map. Returns whether the pair was newly added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if the value comparer is inconsistent, so that
    /// promoting the key to a value set does not yield exactly two values. The map is left
    /// as it was before the call.
    ///
    /// # Examples
    ///
    /// ```
    /// use multivalue_map::MultiValueMap;
    ///
    /// let mut map = MultiValueMap::new();
    ///
    /// assert_eq!(map.try_insert("k", 1), Ok(true));
    /// assert_eq!(map.try_insert("k", 1), Ok(false));
    /// assert_eq!(map.try_insert("k", 2), Ok(true));
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<bool> {
        let hash = self.key_comparer.hash(&key);
        let key_comparer = &self.key_comparer;

        match self.table.get_mut(hash, |x| key_comparer.equals(&x.0, &key)) {
            Some((_, entry)) => {
                if !entry.insert(value, &self.value_comparer)? {
                    return Ok(false);
                }
            }
            None => {
                let entry = (key, Entry::Single(value));
                self.table.insert(hash, entry, |x| key_comparer.hash(&x.0));
            }
        }

        self.len += 1;
        Ok(true)
    }

    /// Returns the stored entry for the key, if any.
    pub fn get_entry(&self, key: &K) -> Option<&Entry<V>> {
        let hash = self.key_comparer.hash(key);

        self.table
            .get(hash, |x| self.key_comparer.equals(&x.0, key))
            .map(|(_, entry)| entry)
    }

    /// Returns `true` if the map holds at least one value for the key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get_entry(key).is_some()
    }

    /// Returns one value associated with the key, or `None` if the key is absent.
    ///
    /// For a key with several values, which one is returned is unspecified.
    ///
    /// # Examples
    ///
    /// ```
    /// use multivalue_map::MultiValueMap;
    ///
    /// let mut map = MultiValueMap::new();
    /// map.insert(1, 1);
    /// map.insert(1, 2);
    ///
    /// assert!(map.get_any(&1).is_some()); // Could be either Some(&1) or Some(&2).
    /// assert!(map.get_any(&2).is_none());
    /// ```
    pub fn get_any(&self, key: &K) -> Option<&V> {
        self.get_entry(key).and_then(Entry::any)
    }

    /// An iterator visiting every value associated with the key in arbitrary order.
    ///
    /// The iterator is empty if the key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use multivalue_map::MultiValueMap;
    ///
    /// let mut map = MultiValueMap::new();
    /// map.insert(1, 1);
    /// map.insert(1, 2);
    ///
    /// let mut values: Vec<_> = map.get_all(&1).collect();
    /// values.sort_unstable();
    ///
    /// assert_eq!(values, [&1, &2]);
    /// assert_eq!(map.get_all(&2).count(), 0);
    /// ```
    pub fn get_all(&self, key: &K) -> ValuesOf<'_, V> {
        ValuesOf {
            iter: self.get_entry(key).map(Entry::iter),
        }
    }

    /// Returns the number of values associated with the key: 0 if it is absent.
    pub fn count_of(&self, key: &K) -> usize {
        self.get_entry(key).map_or(0, Entry::len)
    }

    /// Returns `true` if the map contains the key-value pair.
    pub fn contains_pair(&self, key: &K, value: &V) -> bool {
        self.get_entry(key)
            .map_or(false, |entry| entry.contains(value, &self.value_comparer))
    }
}

impl<K, V, KC, VC> Clone for MultiValueMap<K, V, KC, VC>
where
    K: Clone,
    V: Clone,
    KC: Clone,
    VC: Clone,
{
    fn clone(&self) -> Self {
        Self {
            key_comparer: self.key_comparer.clone(),
            value_comparer: self.value_comparer.clone(),
            table: self.table.clone(),
            len: self.len,
        }
    }
}

impl<K, V, KC, VC> Default for MultiValueMap<K, V, KC, VC>
where
    KC: Default,
    VC: Default,
{
    fn default() -> Self {
        Self::with_comparers(KC::default(), VC::default())
    }
}

impl<K, V, KC, VC> Debug for MultiValueMap<K, V, KC, VC>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, KC, VC> FromIterator<(K, V)> for MultiValueMap<K, V, KC, VC>
where
    KC: Comparer<K> + Default,
    VC: Comparer<V> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, KC, VC> Extend<(K, V)> for MultiValueMap<K, V, KC, VC>
where
    KC: Comparer<K>,
    VC: Comparer<V>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, KC, VC> Extend<(&'a K, &'a V)> for MultiValueMap<K, V, KC, VC>
where
    K: Copy,
    V: Copy,
    KC: Comparer<K>,
    VC: Comparer<V>,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(&key, &value)| (key, value)));
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for MultiValueMap<K, V>
where
    DefaultComparer: Comparer<K> + Comparer<V>,
{
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, K, V, KC, VC> IntoIterator for &'a MultiValueMap<K, V, KC, VC> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// An iterator over the key-value pairs of a `MultiValueMap`.
pub struct Iter<'a, K, V> {
    entries: RawIter<(K, Entry<V>)>,
    current: Option<(&'a K, entry::Iter<'a, V>)>,
    remaining: usize,
    phantom: PhantomData<(&'a K, &'a V)>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            current: self.current.clone(),
            remaining: self.remaining,
            phantom: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        loop {
            if let Some((key, values)) = self.current.as_mut() {
                if let Some(value) = values.next() {
                    self.remaining -= 1;
                    return Some((*key, value));
                }
            }

            let bucket = self.entries.next()?;
            let (key, entry) = unsafe { bucket.as_ref() };
            self.current = Some((key, entry.iter()));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K: Debug, V: Debug> Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the distinct keys of a `MultiValueMap`.
pub struct Keys<'a, K, V> {
    iter: RawIter<(K, Entry<V>)>,
    phantom: PhantomData<(&'a K, &'a V)>,
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
            phantom: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.iter.next().map(|bucket| unsafe { &bucket.as_ref().0 })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.iter.len()
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K: Debug, V> Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the value of every pair of a `MultiValueMap`.
pub struct Values<'a, K, V> {
    iter: Iter<'a, K, V>,
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.iter.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.iter.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

/// An iterator over the values associated with one key of a `MultiValueMap`.
///
/// Empty if the key is absent.
pub struct ValuesOf<'a, V> {
    iter: Option<entry::Iter<'a, V>>,
}

impl<V> Clone for ValuesOf<'_, V> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
        }
    }
}

impl<'a, V> Iterator for ValuesOf<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.iter.as_mut()?.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.as_ref().map_or((0, Some(0)), Iterator::size_hint)
    }
}

impl<V> ExactSizeIterator for ValuesOf<'_, V> {}

impl<V> FusedIterator for ValuesOf<'_, V> {}

impl<V: Debug> Debug for ValuesOf<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparer::FnComparer;
    use std::collections::HashSet;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    /// Treats two integers as equal when they differ only in the lowest bit.
    fn low_bit_masked() -> FnComparer<fn(&i32, &i32) -> bool, fn(&i32) -> u64> {
        FnComparer::new(|a, b| a & !1 == b & !1, |v| (v & !1) as u64)
    }

    fn sorted_pairs<KC, VC>(map: &MultiValueMap<i32, i32, KC, VC>) -> Vec<(i32, i32)> {
        let mut pairs: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        pairs.sort_unstable();
        pairs
    }

    #[test]
    fn distinct_keys_stay_single() {
        let mut map = MultiValueMap::new();
        for (key, value) in [(0, 100), (1, 101), (2, 102), (3, 103)] {
            assert!(map.insert(key, value));
        }

        assert_eq!(map.len(), 4);
        assert_eq!(map.key_count(), 4);
        for key in 0..4 {
            assert_eq!(map.count_of(&key), 1);
            assert_eq!(map.get_any(&key), Some(&(100 + key)));
            assert!(!map.get_entry(&key).map_or(true, Entry::is_multi));
        }
    }

    #[test]
    fn masked_comparers_merge_keys_and_values() {
        let mut map = MultiValueMap::with_comparers(low_bit_masked(), low_bit_masked());
        for (key, value) in [(0, 100), (1, 101), (1, 201), (2, 102), (3, 103), (3, 203)] {
            map.insert(key, value);
        }

        assert_eq!(map.len(), 4);
        assert_eq!(map.key_count(), 2);
        assert_eq!(map.count_of(&0), 2);
        assert_eq!(map.count_of(&1), 2);
        assert_eq!(map.count_of(&3), 2);
        assert_eq!(sorted_pairs(&map), [(0, 100), (0, 201), (2, 102), (2, 203)]);
        assert!(map.contains_pair(&1, &101));
        assert!(map.contains_pair(&2, &203));
        assert!(!map.contains_pair(&2, &201));
    }

    #[test]
    fn key_comparer_alone_merges_keys() {
        let mut map = MultiValueMap::with_key_comparer(low_bit_masked());
        map.insert(0, 100);
        map.insert(1, 101);

        assert_eq!(map.key_count(), 1);
        assert_eq!(map.count_of(&0), 2);
        assert_eq!(map.count_of(&1), 2);
    }

    #[test]
    fn value_comparer_alone_merges_values() {
        let mut map = MultiValueMap::with_value_comparer(low_bit_masked());

        assert!(map.insert("k", 100));
        assert!(!map.insert("k", 101));
        assert!(map.insert("k", 102));
        assert_eq!(map.count_of(&"k"), 2);
    }

    #[test]
    fn promotion_counts_up() {
        let mut map = MultiValueMap::new();

        map.insert('k', 1);
        assert_eq!(map.count_of(&'k'), 1);
        map.insert('k', 2);
        assert_eq!(map.count_of(&'k'), 2);
        map.insert('k', 3);
        assert_eq!(map.count_of(&'k'), 3);
        assert!(map.get_entry(&'k').map_or(false, Entry::is_multi));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn duplicate_insert_is_idempotent() {
        let mut map = MultiValueMap::new();

        assert!(map.insert(1, 1));
        assert!(!map.insert(1, 1));
        assert_eq!(map.len(), 1);

        map.insert(1, 2);
        assert!(!map.insert(1, 2));
        assert!(!map.insert(1, 1));
        assert_eq!(map.len(), 2);
        assert_eq!(map.count_of(&1), 2);
    }

    #[test]
    fn absent_keys_are_not_errors() {
        let map: MultiValueMap<i32, i32> = MultiValueMap::new();

        assert_eq!(map.get_any(&1), None);
        assert_eq!(map.get_all(&1).len(), 0);
        assert_eq!(map.get_all(&1).next(), None);
        assert_eq!(map.count_of(&1), 0);
        assert!(!map.contains_pair(&1, &1));
        assert!(!map.contains_key(&1));
    }

    #[test]
    fn get_all_is_fresh_per_call() {
        let mut map = MultiValueMap::new();
        map.insert(1, 10);

        let before = map.get_all(&1);
        assert_eq!(before.clone().count(), 1);
        assert_eq!(before.count(), 1);

        map.insert(1, 20);
        let values: HashSet<_> = map.get_all(&1).copied().collect();
        assert_eq!(values, HashSet::from([10, 20]));
    }

    #[test]
    fn iterators_cover_every_pair() {
        let map = MultiValueMap::from([(1, 'a'), (1, 'b'), (2, 'c'), (3, 'd'), (3, 'd')]);

        let iter = map.iter();
        assert_eq!(iter.len(), 4);
        let pairs: HashSet<_> = iter.map(|(&k, &v)| (k, v)).collect();
        assert_eq!(pairs, HashSet::from([(1, 'a'), (1, 'b'), (2, 'c'), (3, 'd')]));

        assert_eq!(map.keys().len(), 3);
        let mut values: Vec<_> = map.values().copied().collect();
        values.sort_unstable();
        assert_eq!(values, ['a', 'b', 'c', 'd']);

        assert_eq!((&map).into_iter().count(), map.len());
    }

    #[test]
    fn remove_pair_is_unsupported() {
        let mut map = MultiValueMap::new();
        assert_eq!(map.remove_pair(&1, &1), Err(Error::Unsupported("remove_pair")));

        map.insert(1, 1);
        map.insert(1, 2);
        assert_eq!(map.remove_pair(&1, &1), Err(Error::Unsupported("remove_pair")));
        assert_eq!(map.remove_pair(&9, &9), Err(Error::Unsupported("remove_pair")));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn clear_resets_everything() {
        let mut map = MultiValueMap::new();
        map.extend([(1, 1), (1, 2), (2, 3)]);

        map.clear();

        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.key_count(), 0);
        assert_eq!(map.count_of(&1), 0);
        assert_eq!(map.count_of(&2), 0);
        assert_eq!(map.iter().next(), None);

        map.insert(1, 5);
        assert_eq!(map.count_of(&1), 1);
    }

    #[test]
    fn keys_without_native_equality() {
        struct Opaque(u32);

        let mut map = MultiValueMap::with_comparers(
            FnComparer::new(|a: &Opaque, b: &Opaque| a.0 == b.0, |k: &Opaque| u64::from(k.0)),
            FnComparer::new(|a: &Opaque, b: &Opaque| a.0 == b.0, |v: &Opaque| u64::from(v.0)),
        );
        map.insert(Opaque(1), Opaque(10));
        map.insert(Opaque(1), Opaque(11));
        map.insert(Opaque(1), Opaque(10));

        assert_eq!(map.len(), 2);
        assert!(map.contains_pair(&Opaque(1), &Opaque(11)));
    }

    #[test]
    fn inconsistent_value_comparer_leaves_map_untouched() {
        let flipped = std::cell::Cell::new(false);
        let comparer = FnComparer::new(|_: &i32, _: &i32| flipped.replace(true), |_: &i32| 0_u64);
        let mut map = MultiValueMap::with_value_comparer(comparer);
        map.insert(1, 1);

        assert_eq!(
            map.try_insert(1, 2),
            Err(Error::InvariantViolation {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.count_of(&1), 1);
        assert_eq!(map.get_any(&1), Some(&1));
    }

    #[test]
    #[should_panic(expected = "value comparer is inconsistent")]
    fn insert_panics_on_invariant_violation() {
        let flipped = std::cell::Cell::new(false);
        let comparer = FnComparer::new(|_: &i32, _: &i32| flipped.replace(true), |_: &i32| 0_u64);
        let mut map = MultiValueMap::with_value_comparer(comparer);
        map.insert(1, 1);
        map.insert(1, 2);
    }

    #[test]
    fn debug_lists_every_pair() {
        let mut map = MultiValueMap::new();
        map.insert("k", 1);

        assert_eq!(format!("{map:?}"), r#"{"k": 1}"#);
    }

    #[test]
    fn iter_sees_later_inserts() {
        let mut map = MultiValueMap::new();
        map.insert(1, 10);
        assert_eq!(map.iter().collect::<Vec<_>>(), [(&1, &10)]);

        map.insert(1, 20);

        let pairs: HashSet<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        assert_eq!(pairs, HashSet::from([(1, 10), (1, 20)]));
        assert_eq!(map.iter().len(), 2);
    }

    #[test]
    fn panicking_value_comparer_leaves_map_consistent() {
        let comparer = FnComparer::new(
            |a: &i32, b: &i32| a == b,
            |v: &i32| {
                assert_ne!(*v, 2, "refusing to hash 2");
                *v as u64
            },
        );
        let mut map = MultiValueMap::with_value_comparer(comparer);
        map.insert(1, 1);

        let outcome = catch_unwind(AssertUnwindSafe(|| map.insert(1, 2)));

        assert!(outcome.is_err());
        assert_eq!(map.len(), 1);
        assert_eq!(map.count_of(&1), 1);
        assert_eq!(map.get_any(&1), Some(&1));
        assert!(!map.get_entry(&1).map_or(true, Entry::is_multi));
        assert_eq!(map.iter().len(), map.iter().count());

        assert!(map.insert(1, 3));
        assert_eq!(map.count_of(&1), 2);
        assert_eq!(map.iter().count(), 2);
    }

    #[test]
    fn capacity_controls() {
        let mut map = MultiValueMap::new();
        map.reserve(32);
        assert!(map.capacity() >= 32);

        map.extend((0..8).map(|k| (k, k)));
        assert!(map.try_reserve(16).is_ok());
        assert!(map.try_reserve(usize::MAX).is_err());

        map.shrink_to(8);
        assert!(map.capacity() >= 8);
        assert_eq!(map.len(), 8);
        assert_eq!(map.count_of(&7), 1);

        map.clear();
        map.shrink_to_fit();
        assert_eq!(map.capacity(), 0);
    }
}

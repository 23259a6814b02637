use std::collections::hash_map::RandomState;
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash, Hasher};

/// Decides when two items are the same and how an item hashes.
///
/// Implementations must be consistent: two items that are equal must hash to the same value.
/// A [`MultiValueMap`](crate::MultiValueMap) relies on its key comparer for key identity
/// and on its value comparer for value uniqueness within a key, and on nothing else.
pub trait Comparer<T: ?Sized> {
    /// Returns `true` if `a` and `b` are to be treated as the same item.
    fn equals(&self, a: &T, b: &T) -> bool;

    /// Returns the hash of `item`.
    fn hash(&self, item: &T) -> u64;
}

impl<T: ?Sized, C: Comparer<T> + ?Sized> Comparer<T> for &C {
    fn equals(&self, a: &T, b: &T) -> bool {
        (**self).equals(a, b)
    }

    fn hash(&self, item: &T) -> u64 {
        (**self).hash(item)
    }
}

/// Compares items with their own [`Eq`] and [`Hash`] implementations,
/// hashing through the given [`BuildHasher`].
///
/// # Examples
///
/// ```
/// use multivalue_map::{Comparer, DefaultComparer};
///
/// let comparer = DefaultComparer::new();
///
/// assert!(comparer.equals(&"a", &"a"));
/// assert_eq!(comparer.hash(&"a"), comparer.hash(&"a"));
/// ```
#[derive(Clone, Default)]
pub struct DefaultComparer<S = RandomState> {
    hash_builder: S,
}

impl DefaultComparer<RandomState> {
    /// Creates a comparer with a randomly seeded hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(RandomState::default())
    }
}

impl<S> DefaultComparer<S> {
    /// Creates a comparer which will use the given hash builder to hash items.
    pub const fn with_hasher(hash_builder: S) -> Self {
        Self { hash_builder }
    }

    /// Returns a reference to the comparer's [`BuildHasher`].
    pub const fn hasher(&self) -> &S {
        &self.hash_builder
    }
}

impl<T, S> Comparer<T> for DefaultComparer<S>
where
    T: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }

    fn hash(&self, item: &T) -> u64 {
        let mut state = self.hash_builder.build_hasher();
        item.hash(&mut state);
        state.finish()
    }
}

impl<S> Debug for DefaultComparer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultComparer").finish_non_exhaustive()
    }
}

/// Compares items with a pair of closures, one for equality and one for hashing.
///
/// Useful for types without [`Eq`] or [`Hash`], or to merge items that differ natively.
///
/// # Examples
///
/// ```
/// use multivalue_map::{Comparer, FnComparer};
///
/// // Ignores case.
/// let comparer = FnComparer::new(
///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
///     |s: &String| s.len() as u64,
/// );
///
/// assert!(comparer.equals(&"Key".to_owned(), &"KEY".to_owned()));
/// ```
#[derive(Clone, Copy)]
pub struct FnComparer<E, H> {
    equals: E,
    hash: H,
}

impl<E, H> FnComparer<E, H> {
    /// Creates a comparer from an equality closure and a hash closure.
    ///
    /// The closures must agree: items reported equal must hash identically.
    pub const fn new(equals: E, hash: H) -> Self {
        Self { equals, hash }
    }
}

impl<T, E, H> Comparer<T> for FnComparer<E, H>
where
    T: ?Sized,
    E: Fn(&T, &T) -> bool,
    H: Fn(&T) -> u64,
{
    fn equals(&self, a: &T, b: &T) -> bool {
        (self.equals)(a, b)
    }

    fn hash(&self, item: &T) -> u64 {
        (self.hash)(item)
    }
}

impl<E, H> Debug for FnComparer<E, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComparer").finish_non_exhaustive()
    }
}

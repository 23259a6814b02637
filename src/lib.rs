//! A multimap exposed as a collection of unique key-value pairs, which stores
//! a key's value inline until the key receives a second distinct value.
//!
//! ---
//!
//! [`MultiValueMap`] keeps one [`Entry`] per key:
//!  - `a -> 1` (a single value, no auxiliary collection)
//!  - `b -> {2, 3}` (a [`ValueSet`], allocated on the second distinct value)
//!
//! as opposed to the common implementation which allocates a collection for every key:
//!  - `a -> {1}`
//!  - `b -> {2, 3}`
//!
//! ---
//!
//! Equality and hashing of both keys and values are supplied by a [`Comparer`].
//! [`DefaultComparer`] uses the types' own [`Eq`] and [`Hash`](std::hash::Hash),
//! while [`FnComparer`] wraps a pair of closures, so neither keys nor values need
//! any notion of equality of their own.
//!
//! The map is not thread-safe and does not support removing individual pairs:
//! [`MultiValueMap::remove_pair`] always fails with [`Error::Unsupported`].

/// Equality and hashing strategies for keys and values.
pub mod comparer;

/// Per-key storage: a single inline value or a set of values.
pub mod entry;

/// Error type shared by the fallible operations.
pub mod error;

/// The multimap itself.
pub mod map;

/// Hash set holding the values of a promoted key.
pub mod set;

#[cfg(feature = "serde")]
mod serde;

pub use comparer::{Comparer, DefaultComparer, FnComparer};
pub use entry::Entry;
pub use error::{Error, Result};
pub use hashbrown::TryReserveError;
pub use map::MultiValueMap;
pub use set::ValueSet;

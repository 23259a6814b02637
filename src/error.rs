use thiserror::Error;

/// Errors raised by [`MultiValueMap`](crate::MultiValueMap).
///
/// Absent keys are never an error: lookups report them through `None`,
/// empty iterators or a zero count.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The operation is deliberately not provided by the map.
    #[error("operation `{0}` is not supported")]
    Unsupported(&'static str),

    /// Promoting a key to a value set did not yield the expected number of values,
    /// which means the value comparer is inconsistent.
    #[error("promoted value set holds {actual} values, expected {expected}; the value comparer is inconsistent")]
    InvariantViolation { expected: usize, actual: usize },
}

/// Result type for map operations.
pub type Result<T> = std::result::Result<T, Error>;

use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for hint generation.
pub type Result<T> = StdResult<T, Error>;

/// Errors raised while labelling candidates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// No candidates were supplied.
    #[error("no elements to label")]
    Empty,

    /// More candidates than distinct labels of at most three characters.
    #[error("cannot label {count} elements with {alphabet} characters (capacity {capacity})")]
    Capacity {
        /// Requested label count.
        count: usize,
        /// Alphabet size.
        alphabet: usize,
        /// Largest count that can be labelled.
        capacity: usize,
    },

    /// The alphabet cannot produce useful labels.
    #[error("invalid hint alphabet: {0}")]
    Alphabet(String),
}

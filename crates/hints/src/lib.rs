//! Hint labels for interactive elements.
//!
//! [`HintGenerator`] assigns short, uniform-length labels to candidates and
//! [`HintCollection`] matches typed keys against them one keystroke at a time.

mod collection;
mod error;
mod generator;

pub use collection::{HintCollection, InputOutcome};
pub use error::{Error, Result};
pub use generator::{DEFAULT_ALPHABET, Hint, HintGenerator, MAX_LABEL_LEN};

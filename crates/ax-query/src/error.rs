use std::{io, result::Result as StdResult};

use thiserror::Error;

use crate::ElementId;

/// Convenient result type for the query engine.
pub type Result<T> = StdResult<T, Error>;

/// Failures surfaced to callers of the query engine.
///
/// Attribute failures on individual children are not errors: those nodes are
/// skipped during traversal. Only failures that invalidate a whole query are
/// reported here.
#[derive(Debug, Error)]
pub enum Error {
    /// The root element's attributes could not be read, so no tree exists.
    #[error("failed to read attributes of root element {0}")]
    RootInfo(ElementId),

    /// The platform reported no frontmost window to scan.
    #[error("no frontmost window")]
    NoFrontmostWindow,

    /// No application matched the requested bundle identifier.
    #[error("application not found: {0}")]
    AppNotFound(String),

    /// Spawning a background thread failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

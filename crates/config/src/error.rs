//! Error types for configuration loading and validation.

use std::{
    path::{Path, PathBuf},
    result::Result as StdResult,
};

use thiserror::Error;

/// Convenient result type for configuration handling.
pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors produced while loading, parsing, or validating a configuration.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// RON syntax or schema error.
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// Parser message, including the line and column.
        message: String,
    },
    #[error("{message}")]
    /// A value parsed but is not acceptable.
    Validation {
        /// Optional path associated with the validation error.
        path: Option<PathBuf>,
        /// Human-readable error message naming the offending field.
        message: String,
    },
}

impl Error {
    /// Shorthand for a validation error with no path attached yet.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            path: None,
            message: message.into(),
        }
    }

    /// Attach `path` to an error that has none.
    pub(crate) fn with_path(self, p: &Path) -> Self {
        let p = Some(p.to_path_buf());
        match self {
            Self::Read { path: None, message } => Self::Read { path: p, message },
            Self::Parse { path: None, message } => Self::Parse { path: p, message },
            Self::Validation { path: None, message } => Self::Validation { path: p, message },
            other => other,
        }
    }

    /// Render a human-friendly error message including the path when known.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("Read error at {}: {}", p.display(), message),
                None => format!("Read error: {}", message),
            },
            Self::Parse { path, message } => match path {
                Some(p) => format!("Config parse error in {}\n{}", p.display(), message),
                None => format!("Config parse error\n{}", message),
            },
            Self::Validation { path, message } => match path {
                Some(p) => format!("Config validation error in {}\n{}", p.display(), message),
                None => format!("Config validation error\n{}", message),
            },
        }
    }

    /// Access the optional path attached to this error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }
}

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the keynav engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The daemon is stopped; activations are refused.
    #[error("keynav is not running")]
    NotRunning,

    /// The requested mode is turned off in configuration.
    #[error("{0} mode is disabled by config")]
    ModeDisabled(&'static str),

    /// Candidate collection failed at the root of the traversal.
    #[error("accessibility query failed: {0}")]
    Ax(#[from] ax_query::Error),

    /// Hint labels could not be generated.
    #[error("hint generation failed: {0}")]
    Hints(#[from] hints::Error),

    /// The mode state machine rejected a transition.
    #[error("mode error: {0}")]
    Mode(#[from] navmode::NavmodeError),

    /// The overlay could not draw.
    #[error("overlay error: {0}")]
    Overlay(String),

    /// Hotkey registration or removal failed.
    #[error("hotkey error: {0}")]
    Hotkey(String),

    /// An `exec` binding without a command.
    #[error("empty command")]
    EmptyCommand,

    /// I/O failure while performing a system operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with context.
    #[error("engine error: {0}")]
    Msg(String),
}

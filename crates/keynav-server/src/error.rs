use std::{io::Error as IoError, result::Result as StdResult};

use thiserror::Error;

/// Errors from the IPC server, client and daemon assembly.
#[derive(Error, Debug)]
pub enum Error {
    /// Socket setup or connection handling failed.
    #[error("IPC error: {0}")]
    Ipc(String),

    /// Nothing is listening on the socket.
    #[error("keynav daemon is not running (no server at {0})")]
    NotRunning(String),

    /// A connect or request deadline passed.
    #[error("timed out {0}")]
    Timeout(&'static str),

    /// Framing or JSON failure.
    #[error(transparent)]
    Protocol(#[from] keynav_protocol::ipc::Error),

    /// Engine setup failed.
    #[error(transparent)]
    Engine(#[from] keynav_engine::Error),

    /// Attribute cache sweeper could not start.
    #[error(transparent)]
    Ax(#[from] ax_query::Error),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = StdResult<T, Error>;

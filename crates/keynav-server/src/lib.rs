//! IPC server and client for the keynav daemon.
//!
//! - [`Server`] assembles a running daemon around an [`Engine`]: it installs
//!   the engine, starts the attribute cache sweeper and serves commands on a
//!   Unix socket until shutdown is requested.
//! - [`Client`] sends one command and waits for its response.
//! - [`CommandHandler`] is the seam between the socket and whatever executes
//!   commands; [`Engine`] implements it.
//!
//! Every request is a length-delimited JSON [`Command`] answered by one
//! [`Response`] (see [`keynav_protocol::ipc`]).
//!
//! [`Engine`]: keynav_engine::Engine
//! [`Command`]: keynav_protocol::Command
//! [`Response`]: keynav_protocol::Response

use std::{env, path::PathBuf};

mod client;
mod error;
mod ipc;
mod server;

pub use client::Client;
pub use error::{Error, Result};
pub use ipc::{CommandHandler, IPCServer};
pub use server::Server;

/// File name of the daemon socket inside the runtime directory.
const SOCKET_NAME: &str = "keynav.sock";

/// Return the per-user runtime directory used for the IPC socket.
///
/// Preference order:
/// - `$XDG_RUNTIME_DIR/keynav`
/// - `<temp dir>/keynav-<uid>`
pub fn socket_runtime_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_RUNTIME_DIR")
        && !xdg.is_empty()
    {
        return PathBuf::from(xdg).join("keynav");
    }
    let uid = unsafe { libc::getuid() };
    env::temp_dir().join(format!("keynav-{uid}"))
}

/// The well-known socket path shared by the daemon and the CLI.
pub fn default_socket_path() -> String {
    socket_runtime_dir()
        .join(SOCKET_NAME)
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_lives_in_runtime_dir() {
        let path = PathBuf::from(default_socket_path());
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(SOCKET_NAME));
        assert_eq!(path.parent(), Some(socket_runtime_dir().as_path()));
    }
}

//! Unix-socket command server.

use std::{
    fs,
    os::unix::fs::{FileTypeExt as _, MetadataExt as _, PermissionsExt as _},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use keynav_protocol::{Command, Response, ipc};
use tokio::{
    net::{UnixListener, UnixStream},
    select,
    time::{sleep, timeout},
};
use tracing::{debug, error, info, trace, warn};

use super::CommandHandler;
use crate::{Error, Result};

/// Upper bound on the lifetime of one client connection.
pub const CONNECTION_DEADLINE: Duration = Duration::from_secs(30);

/// How often the accept loop checks the shutdown flag.
const SHUTDOWN_POLL_MS: u64 = 50;

/// Threshold for warning about slow command handling
const COMMAND_WARN_MS: u64 = 100;

/// IPC server
pub struct IPCServer<H> {
    socket_path: String,
    handler: Arc<H>,
    shutdown: Arc<AtomicBool>,
    deadline: Duration,
}

impl<H: CommandHandler> IPCServer<H> {
    /// Create a server that answers commands on `socket_path` with `handler`.
    pub fn new(socket_path: impl Into<String>, handler: Arc<H>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            socket_path: socket_path.into(),
            handler,
            shutdown,
            deadline: CONNECTION_DEADLINE,
        }
    }

    /// Override the per-connection deadline.
    pub fn with_connection_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Path of the listening socket.
    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    /// Bind the socket and serve connections until the shutdown flag is set.
    pub async fn run(&self) -> Result<()> {
        trace!("Starting IPC server on socket: {}", self.socket_path);

        if let Some(parent) = Path::new(&self.socket_path).parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
            let mut perms = fs::metadata(parent)?.permissions();
            perms.set_mode(0o700);
            if let Err(e) = fs::set_permissions(parent, perms) {
                warn!("failed to restrict {}: {}", parent.display(), e);
            }
        }

        // Only unlink a stale path that is our own socket.
        validate_or_unlink_existing_socket(&self.socket_path)?;

        let listener = UnixListener::bind(&self.socket_path)
            .map_err(|e| Error::Ipc(format!("Failed to bind to socket: {}", e)))?;
        info!("IPC server listening on {}", self.socket_path);

        while !self.shutdown.load(Ordering::SeqCst) {
            select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => self.spawn_connection(stream),
                    Err(e) => {
                        error!("accept failed: {}", e);
                        sleep(Duration::from_millis(SHUTDOWN_POLL_MS)).await;
                    }
                },
                _ = sleep(Duration::from_millis(SHUTDOWN_POLL_MS)) => {}
            }
        }
        debug!("Shutdown flag set; stopping IPC server");
        Ok(())
    }

    fn spawn_connection(&self, stream: UnixStream) {
        let handler = self.handler.clone();
        let deadline = self.deadline;
        tokio::spawn(async move {
            match timeout(deadline, serve_connection(stream, handler)).await {
                Ok(Ok(())) => trace!("client disconnected"),
                Ok(Err(e)) => warn!("connection failed: {}", e),
                Err(_) => warn!("connection exceeded {:?}; closing", deadline),
            }
        });
    }
}

impl<H> Drop for IPCServer<H> {
    fn drop(&mut self) {
        if let Err(e) = validate_or_unlink_existing_socket(&self.socket_path) {
            debug!("socket cleanup skipped: {}", e);
        }
    }
}

/// Answer commands on one connection until the client hangs up.
///
/// A request that is not valid JSON gets a failure response and the
/// connection is closed.
async fn serve_connection<H: CommandHandler>(stream: UnixStream, handler: Arc<H>) -> Result<()> {
    let mut io = ipc::framed(stream);
    loop {
        let cmd: Command = match ipc::recv(&mut io).await {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Ok(()),
            Err(ipc::Error::Json(e)) => {
                warn!("invalid request: {}", e);
                ipc::send(&mut io, &Response::fail(format!("invalid request: {e}"))).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let action = cmd.action.clone();
        let start = Instant::now();
        let resp = handler.handle(cmd).await;
        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(COMMAND_WARN_MS) {
            warn!("command {} took {:?}", action, elapsed);
        }
        debug!(action = %action, success = resp.success, "command handled");
        ipc::send(&mut io, &resp).await?;
    }
}

/// Clear the way for a bind at `path`.
///
/// An absent path is fine. An existing path is removed only when it is a Unix
/// socket owned by the current user; anything else (regular files, symlinks,
/// other users' sockets) is an error and left in place.
fn validate_or_unlink_existing_socket(path: &str) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::Ipc(format!("cannot inspect {path}: {e}"))),
    };
    let kind = meta.file_type();
    if !kind.is_socket() {
        return Err(Error::Ipc(format!(
            "{path} exists and is not a socket ({kind:?}); not removing it"
        )));
    }
    let uid = unsafe { libc::getuid() };
    if meta.uid() != uid {
        return Err(Error::Ipc(format!(
            "socket {path} belongs to uid {}, not {uid}",
            meta.uid()
        )));
    }
    fs::remove_file(path).map_err(|e| Error::Ipc(format!("cannot remove stale socket {path}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixListener as StdUnixListener;

    use super::*;

    fn tmpdir(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "keynav-test-{}-{}-{}",
            unsafe { libc::getuid() },
            std::process::id(),
            name
        ));
        let _ = fs::create_dir_all(&p);
        p
    }

    #[test]
    fn guard_allows_absent_path() {
        let sock = tmpdir("absent").join("nope.sock");
        assert!(validate_or_unlink_existing_socket(sock.to_str().unwrap()).is_ok());
        assert!(!sock.exists());
    }

    #[test]
    fn guard_refuses_regular_file() {
        let p = tmpdir("regular").join("regular.txt");
        fs::write(&p, b"hi").unwrap();
        assert!(validate_or_unlink_existing_socket(p.to_str().unwrap()).is_err());
        // Must not delete arbitrary files
        assert!(p.exists());
    }

    #[test]
    fn guard_refuses_symlink() {
        use std::os::unix::fs::symlink;
        let d = tmpdir("symlink");
        let target = d.join("target.txt");
        fs::write(&target, b"hi").unwrap();
        let link = d.join("link.sock");
        let _ = fs::remove_file(&link);
        symlink(&target, &link).unwrap();
        assert!(validate_or_unlink_existing_socket(link.to_str().unwrap()).is_err());
        assert!(link.exists());
    }

    #[test]
    fn guard_unlinks_owned_socket() {
        let sock = tmpdir("owned").join("owned.sock");
        let _ = fs::remove_file(&sock);
        let _listener = StdUnixListener::bind(&sock).unwrap();
        validate_or_unlink_existing_socket(sock.to_str().unwrap()).unwrap();
        assert!(!sock.exists());
    }
}

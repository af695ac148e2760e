use std::{io::ErrorKind, time::Duration};

use keynav_protocol::{Command, Response, ipc};
use tokio::{net::UnixStream, time::timeout};
use tracing::debug;

use crate::{Error, Result, default_socket_path};

// Connection timing constants
const CONNECT_TIMEOUT_SECS: u64 = 2;
const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Sends commands to a running daemon, one connection per request.
#[derive(Debug, Clone)]
pub struct Client {
    socket_path: String,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// A client for the default socket path.
    pub fn new() -> Self {
        Self::new_with_socket(default_socket_path())
    }

    /// A client for `socket_path`.
    pub fn new_with_socket(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Override the request timeout.
    pub fn with_request_timeout(mut self, t: Duration) -> Self {
        self.request_timeout = t;
        self
    }

    /// Socket this client connects to.
    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    /// Send `cmd` and wait for the daemon's response.
    pub async fn send(&self, cmd: &Command) -> Result<Response> {
        debug!("Connecting to IPC server at: {}", self.socket_path);
        let stream = match timeout(self.connect_timeout, UnixStream::connect(&self.socket_path)).await
        {
            Err(_) => return Err(Error::Timeout("connecting to the keynav daemon")),
            Ok(Err(e)) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::ConnectionRefused) => {
                return Err(Error::NotRunning(self.socket_path.clone()));
            }
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(s)) => s,
        };

        let mut io = ipc::framed(stream);
        let exchange = async {
            ipc::send(&mut io, cmd).await?;
            ipc::recv::<_, Response>(&mut io).await
        };
        match timeout(self.request_timeout, exchange).await {
            Err(_) => Err(Error::Timeout("waiting for the keynav daemon")),
            Ok(Ok(Some(resp))) => Ok(resp),
            Ok(Ok(None)) => Err(Error::Ipc("daemon closed the connection".into())),
            Ok(Err(e)) => Err(e.into()),
        }
    }
}

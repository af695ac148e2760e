use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use keynav_engine::Engine;
use tracing::{error, info};

use crate::{Result, default_socket_path, ipc::IPCServer};

/// A running keynav daemon: engine, attribute cache sweeper and IPC socket.
pub struct Server {
    socket_path: String,
    engine: Engine,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Serve `engine` on the default socket path.
    pub fn new(engine: Engine) -> Self {
        Self {
            socket_path: default_socket_path(),
            engine,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the socket path for IPC communication
    pub fn with_socket_path(mut self, path: impl Into<String>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Path the server listens on.
    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    /// The engine commands are routed to.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Flag that stops [`run`](Self::run) when set.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Run the daemon until the shutdown flag is set.
    ///
    /// This will:
    /// 1. Install the engine (focus subscription and hotkeys)
    /// 2. Start the attribute cache sweeper
    /// 3. Serve IPC commands
    /// 4. On shutdown, exit any mode and release hotkeys and host switches
    pub async fn run(self) -> Result<()> {
        info!("Starting keynav server on socket: {}", self.socket_path);
        self.engine.install()?;
        let sweeper = self.engine.cache().spawn_sweeper()?;

        let ipc = IPCServer::new(
            &self.socket_path,
            Arc::new(self.engine.clone()),
            self.shutdown.clone(),
        );
        let res = ipc.run().await;
        if let Err(e) = &res {
            error!("IPC server error: {}", e);
            self.shutdown.store(true, Ordering::SeqCst);
        }

        self.engine.shutdown().await;
        drop(sweeper);
        drop(ipc);
        info!("Shutdown complete");
        res
    }
}

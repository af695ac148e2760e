use async_trait::async_trait;
use keynav_engine::Engine;
use keynav_protocol::{Command, Response};

mod server;

pub use server::IPCServer;

/// Executes commands received over the socket.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Produce the response for one command.
    async fn handle(&self, cmd: Command) -> Response;
}

#[async_trait]
impl CommandHandler for Engine {
    async fn handle(&self, cmd: Command) -> Response {
        self.handle_command(&cmd).await
    }
}

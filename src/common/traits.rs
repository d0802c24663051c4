use crate::{EchoError, Result};
use async_trait::async_trait;

/// Common trait for echo servers
#[async_trait]
pub trait EchoServerTrait {
    /// Starts the echo server and serves connections until shutdown
    async fn run(&self) -> Result<()>;

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()>;
}

/// Common trait for echo clients
#[async_trait]
pub trait EchoClient: Send {
    /// Sends one request payload and returns the response payload
    async fn echo(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Sends a string and returns the echoed string
    async fn echo_string(&mut self, data: &str) -> Result<String> {
        let response = self.echo(data.as_bytes()).await?;
        String::from_utf8(response).map_err(|e| EchoError::Encoding(e.utf8_error()))
    }
}

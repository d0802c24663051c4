use crate::stream::StreamConfig;
use crate::tcp::TcpEchoServer;
use crate::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A TCP echo server running in a background task
pub struct TestServer {
    pub addr: SocketAddr,
    pub server: Arc<TcpEchoServer>,
    pub handle: JoinHandle<Result<()>>,
}

impl TestServer {
    /// Stops the accept loop and waits for it to finish.
    pub async fn shutdown(self) -> Result<()> {
        self.server.stop();
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(crate::EchoError::Config(format!("Server task failed: {e}"))),
        }
    }
}

/// Starts a TCP echo server on an ephemeral loopback port for tests.
///
/// The listener is bound before this returns, so clients can connect
/// immediately.
pub async fn spawn_test_server(config: StreamConfig) -> Result<TestServer> {
    let config = StreamConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        ..config
    };

    let server = Arc::new(TcpEchoServer::new(config));
    let listener = server.bind().await?;
    let addr = listener.local_addr()?;

    let handle = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve(listener).await })
    };

    Ok(TestServer {
        addr,
        server,
        handle,
    })
}

/// Starts a test server allowing at most `max_connections` live connections.
pub async fn create_controlled_test_server_with_limit(
    max_connections: usize,
) -> Result<(JoinHandle<Result<()>>, SocketAddr)> {
    let server = spawn_test_server(StreamConfig::default().with_max_connections(max_connections)).await?;
    Ok((server.handle, server.addr))
}

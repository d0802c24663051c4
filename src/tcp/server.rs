use super::stream_protocol::TcpProtocol;
use crate::stream::StreamEchoServer;

/// TCP echo server speaking the length-prefixed frame protocol
///
/// This is a type alias for `StreamEchoServer<TcpProtocol>`.
///
/// # Examples
///
/// Basic server setup and running:
///
/// ```no_run
/// use framecho::tcp::TcpEchoServer;
/// use framecho::stream::StreamConfig;
/// use framecho::common::EchoServerTrait;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = StreamConfig::new("0.0.0.0:8080".parse()?)
///         .with_idle_timeout(Duration::from_secs(5));
///
///     let server = TcpEchoServer::new(config);
///     server.run().await?;
///     Ok(())
/// }
/// ```
///
/// Server with graceful shutdown:
///
/// ```no_run
/// use framecho::tcp::TcpEchoServer;
/// use framecho::stream::StreamConfig;
/// use framecho::common::EchoServerTrait;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Arc::new(TcpEchoServer::new(StreamConfig::default()));
///     let shutdown_signal = server.shutdown_signal();
///
///     // Run server in background
///     let server_handle = {
///         let server = Arc::clone(&server);
///         tokio::spawn(async move { server.run().await })
///     };
///
///     // Do other work...
///
///     // Gracefully shutdown
///     let _ = shutdown_signal.send(());
///     server_handle.await??;
///     Ok(())
/// }
/// ```
pub type TcpEchoServer = StreamEchoServer<TcpProtocol>;

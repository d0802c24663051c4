use super::config::StreamConfig;
use std::future::Future;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};

/// Trait for stream-based transports
///
/// This trait defines the interface that a transport must provide to be
/// served by the generic stream echo server and driven by the generic client.
/// Reading and writing go through the stream's `AsyncRead`/`AsyncWrite`
/// implementations so the framing layer can own buffering.
pub trait StreamProtocol: Send + Sync + 'static {
    /// Listener type for this protocol
    type Listener: Send + Sync + 'static;
    /// Stream type for this protocol
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Binds a listener to the given configuration (server-side)
    fn bind(config: &StreamConfig) -> impl Future<Output = crate::Result<Self::Listener>> + Send;

    /// Returns the address the listener is actually bound to
    fn local_addr(listener: &Self::Listener) -> crate::Result<SocketAddr>;

    /// Accepts a new connection from the listener (server-side)
    fn accept(
        listener: &Self::Listener,
    ) -> impl Future<Output = crate::Result<(Self::Stream, SocketAddr)>> + Send;

    /// Connects to a server at the given address (client-side)
    fn connect(addr: SocketAddr) -> impl Future<Output = crate::Result<Self::Stream>> + Send;
}

use crate::stream::{StreamConfig, StreamProtocol};
use crate::{EchoError, Result};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::warn;

/// TCP protocol implementation
pub struct TcpProtocol;

impl TcpProtocol {
    fn listen(addr: SocketAddr, backlog: u32) -> std::io::Result<TcpListener> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };

        // Allow rebinding over TIME_WAIT sockets
        #[cfg(unix)]
        socket.set_reuseaddr(true)?;

        socket.bind(addr)?;
        socket.listen(backlog)
    }
}

impl StreamProtocol for TcpProtocol {
    type Listener = TcpListener;
    type Stream = TcpStream;

    async fn bind(config: &StreamConfig) -> Result<TcpListener> {
        let addr = config.bind_addr;
        Self::listen(addr, config.backlog).map_err(|source| EchoError::Bind { addr, source })
    }

    fn local_addr(listener: &TcpListener) -> Result<SocketAddr> {
        Ok(listener.local_addr()?)
    }

    async fn accept(listener: &TcpListener) -> Result<(TcpStream, SocketAddr)> {
        let (stream, addr) = listener.accept().await?;
        // Responses are written whole, Nagle only adds latency
        if let Err(e) = stream.set_nodelay(true) {
            warn!(%addr, error = %e, "Failed to set TCP_NODELAY");
        }
        Ok((stream, addr))
    }

    async fn connect(addr: SocketAddr) -> Result<TcpStream> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

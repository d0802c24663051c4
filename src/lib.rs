use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Error types for the framecho library
#[derive(Error, Debug)]
pub enum EchoError {
    /// The listening socket could not be bound (address in use, permission denied)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The peer closed the stream in the middle of a frame
    #[error("Truncated frame: expected {expected} bytes, received {received}")]
    TruncatedFrame { expected: usize, received: usize },

    /// Frame payload is not valid UTF-8
    #[error("Invalid UTF-8 payload: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Declared frame length exceeds the configured maximum
    #[error("Frame too large: {length} bytes, maximum allowed: {max} bytes")]
    FrameTooLarge { length: usize, max: usize },

    /// No bytes arrived within the idle timeout
    #[error("Idle timeout after {0:?}")]
    IdleTimeout(Duration),

    /// The response could not be written within the write timeout
    #[error("Write timeout after {0:?}")]
    WriteTimeout(Duration),

    /// Transport errors (accept, connect, read, write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client-side timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),
}

impl EchoError {
    /// Whether the error is a protocol violation or stall by the peer,
    /// as opposed to a transport failure.
    pub fn is_peer_fault(&self) -> bool {
        matches!(
            self,
            EchoError::TruncatedFrame { .. }
                | EchoError::Encoding(_)
                | EchoError::FrameTooLarge { .. }
                | EchoError::IdleTimeout(_)
                | EchoError::WriteTimeout(_)
        )
    }
}

/// Result type for the framecho library
pub type Result<T> = std::result::Result<T, EchoError>;

pub mod common;
pub mod frame;
pub mod security;
pub mod stream;
pub mod tcp;

// Re-export main types for convenience
pub use common::{EchoClient, EchoServerTrait};
pub use frame::{FrameCodec, SUFFIX};
pub use security::{ConnectionMetrics, ConnectionTracker};
pub use stream::{Client as StreamClient, ClientConfig, StreamConfig, StreamEchoServer};
pub use tcp::{TcpEchoClient, TcpEchoServer, TcpProtocol};

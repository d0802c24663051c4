use crate::frame::DEFAULT_MAX_FRAME_SIZE;
use crate::{EchoError, Result};
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for stream-based echo servers
///
/// # Examples
///
/// ```
/// use framecho::stream::StreamConfig;
/// use std::time::Duration;
///
/// let config = StreamConfig::new("0.0.0.0:8080".parse().unwrap())
///     .with_idle_timeout(Duration::from_secs(5))
///     .with_max_frame_size(1024 * 1024);
///
/// assert_eq!(config.idle_timeout, Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
///
/// Using the default configuration:
///
/// ```
/// use framecho::stream::StreamConfig;
///
/// let config = StreamConfig::default();
/// assert_eq!(config.max_frame_size, 16 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Largest payload accepted in a request frame
    pub max_frame_size: usize,
    /// Maximum wait for the next bytes of a frame
    pub idle_timeout: Duration,
    /// Maximum time to write one response frame
    pub write_timeout: Duration,
    /// Listen backlog passed to the OS
    pub backlog: u32,
}

impl StreamConfig {
    /// Create a new configuration with the given address
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_connections: 1024,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            idle_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            backlog: 1024,
        }
    }

    /// Set the maximum number of concurrent connections
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the maximum accepted payload size
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Set the idle read timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the listen backlog
    pub fn with_backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(EchoError::Config("max_connections must be at least 1".into()));
        }
        if self.max_frame_size > u32::MAX as usize {
            return Err(EchoError::Config(format!(
                "max_frame_size {} exceeds the 32-bit length field",
                self.max_frame_size
            )));
        }
        if self.idle_timeout.is_zero() {
            return Err(EchoError::Config("idle_timeout must be non-zero".into()));
        }
        if self.write_timeout.is_zero() {
            return Err(EchoError::Config("write_timeout must be non-zero".into()));
        }
        if self.backlog == 0 {
            return Err(EchoError::Config("backlog must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 0)))
    }
}

use super::{Connection, StreamProtocol};
use crate::common::EchoClient;
use crate::frame::FrameCodec;
use crate::{EchoError, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::timeout;

/// Configuration for stream clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Read timeout for operations
    pub read_timeout: Duration,
    /// Write timeout for operations
    pub write_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum response size to prevent memory exhaustion
    pub max_response_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            max_response_size: 16 * 1024 * 1024 + crate::frame::SUFFIX.len(),
        }
    }
}

/// Stream-based framed echo client
///
/// Sends one request frame per exchange and waits for the matching response
/// frame. Several exchanges may share one connection.
///
/// # Examples
///
/// ```no_run
/// use framecho::tcp::TcpEchoClient;
/// use framecho::common::EchoClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = TcpEchoClient::connect("127.0.0.1:8080".parse()?).await?;
///     let response = client.echo_string("HELLO").await?;
///     assert_eq!(response, "HELLO from echo server");
///     Ok(())
/// }
/// ```
pub struct Client<P: StreamProtocol> {
    connection: Connection<P::Stream>,
}

impl<P: StreamProtocol> Client<P> {
    /// Connect to a server with custom configuration
    pub async fn connect_with_config(addr: SocketAddr, config: ClientConfig) -> Result<Self> {
        let stream = timeout(config.connect_timeout, P::connect(addr))
            .await
            .map_err(|_| EchoError::Timeout(format!("Connection to {addr} timed out")))??;

        let connection = Connection::new(
            stream,
            FrameCodec::new(config.max_response_size),
            config.read_timeout,
            config.write_timeout,
        );

        Ok(Self { connection })
    }

    /// Connect with default configuration
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    /// Send one request frame and read the response frame
    async fn exchange(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.connection.write_frame(data).await.map_err(|e| match e {
            EchoError::WriteTimeout(_) => EchoError::Timeout("Write timeout".to_string()),
            other => other,
        })?;

        let response = match self.connection.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                return Err(EchoError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "server closed the connection without a response",
                )));
            }
            Err(EchoError::IdleTimeout(_)) => {
                return Err(EchoError::Timeout("Read timeout".to_string()));
            }
            Err(e) => return Err(e),
        };

        Ok(response.to_vec())
    }
}

#[async_trait]
impl<P: StreamProtocol> EchoClient for Client<P> {
    async fn echo(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() > u32::MAX as usize {
            return Err(EchoError::Config(format!(
                "Request too large: {} bytes",
                data.len()
            )));
        }

        self.exchange(data).await
    }
}

/// Builder for client configuration
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn max_response_size(mut self, size: usize) -> Self {
        self.config.max_response_size = size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfigBuilder::new()
            .read_timeout(Duration::from_secs(60))
            .write_timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_millis(100))
            .max_response_size(1024 * 1024)
            .build();

        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.write_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_millis(100));
        assert_eq!(config.max_response_size, 1024 * 1024);
    }

    #[test]
    fn test_default_response_limit_fits_suffixed_max_frame() {
        let config = ClientConfig::default();
        assert_eq!(
            config.max_response_size,
            crate::frame::DEFAULT_MAX_FRAME_SIZE + crate::frame::SUFFIX.len()
        );
    }
}

use super::{Connection, StreamConfig, StreamProtocol};
use crate::common::EchoServerTrait;
use crate::frame::{self, FrameCodec};
use crate::security::{ConnectionGuard, ConnectionTracker};
use crate::{EchoError, Result};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// Pause after a failed accept so descriptor exhaustion does not spin the loop
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Generic stream-based echo server that works with any stream protocol
///
/// Each accepted connection runs in its own task and loops over
/// request/response exchanges until the peer closes the stream, a protocol
/// error occurs, or the connection is cancelled. Per-connection failures are
/// logged and never stop the accept loop.
///
/// # Examples
///
/// ```no_run
/// use framecho::stream::{StreamConfig, StreamEchoServer};
/// use framecho::common::EchoServerTrait;
/// use framecho::tcp::TcpProtocol;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = StreamConfig::new("0.0.0.0:8080".parse()?);
///     let server: StreamEchoServer<TcpProtocol> = StreamEchoServer::new(config);
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct StreamEchoServer<P: StreamProtocol> {
    config: StreamConfig,
    protocol: PhantomData<fn() -> P>,
    shutdown_signal: Arc<broadcast::Sender<()>>,
    stop: CancellationToken,
    tracker: Arc<ConnectionTracker>,
    running: Arc<AtomicBool>,
}

impl<P: StreamProtocol> StreamEchoServer<P> {
    /// Creates a new stream-based echo server with the given configuration
    pub fn new(config: StreamConfig) -> Self {
        let (shutdown_signal, _) = broadcast::channel(1);
        let tracker = Arc::new(ConnectionTracker::new(config.max_connections));
        Self {
            config,
            protocol: PhantomData,
            shutdown_signal: Arc::new(shutdown_signal),
            stop: CancellationToken::new(),
            tracker,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Live connection registry and counters
    pub fn tracker(&self) -> Arc<ConnectionTracker> {
        Arc::clone(&self.tracker)
    }

    /// Whether the accept loop is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the server and closes its live connections.
    ///
    /// Takes effect whether or not `serve` is already running; a stopped
    /// server returns from `serve` immediately.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Validates the configuration and binds the listener.
    pub async fn bind(&self) -> Result<P::Listener> {
        self.config.validate()?;
        P::bind(&self.config).await
    }

    /// Runs the accept loop on an already bound listener until shutdown.
    pub async fn serve(&self, listener: P::Listener) -> Result<()> {
        let local_addr = P::local_addr(&listener)?;
        info!(
            address = %local_addr,
            max_connections = self.config.max_connections,
            max_frame_size = self.config.max_frame_size,
            idle_timeout_ms = self.config.idle_timeout.as_millis() as u64,
            "Stream echo server listening"
        );

        let connections = self.stop.child_token();
        let mut shutdown_rx = self.shutdown_signal.subscribe();
        let external_shutdown = external_shutdown();
        tokio::pin!(external_shutdown);
        self.running.store(true, Ordering::SeqCst);

        loop {
            tokio::select! {
                biased;

                _ = self.stop.cancelled() => {
                    info!("Server stopped, closing listener");
                    break;
                }
                accept_result = P::accept(&listener) => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let guard = match self.tracker.try_acquire(addr, &connections) {
                                Ok(guard) => guard,
                                Err(e) => {
                                    warn!(%addr, error = %e, "Connection rejected");
                                    continue;
                                }
                            };

                            let config = self.config.clone();
                            let span = tracing::info_span!("connection", %addr, id = guard.id());
                            tokio::spawn(
                                async move {
                                    info!("Accepted connection");
                                    match Self::handle_connection(stream, &config, &guard).await {
                                        Ok(exchanges) => info!(exchanges, "Connection closed"),
                                        Err(e) if e.is_peer_fault() => {
                                            warn!(error = %e, "Closing connection")
                                        }
                                        Err(e) => error!(error = %e, "Error handling connection"),
                                    }
                                }
                                .instrument(span),
                            );
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                        }
                    }
                }
                _ = &mut external_shutdown => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        connections.cancel();
        self.running.store(false, Ordering::SeqCst);
        info!(
            active_connections = self.tracker.metrics().active_connections,
            "Stream echo server stopped"
        );
        Ok(())
    }

    /// Runs the exchange loop for one connection, returning the number of
    /// completed exchanges when the peer closes cleanly or the connection is
    /// cancelled.
    async fn handle_connection(
        stream: P::Stream,
        config: &StreamConfig,
        guard: &ConnectionGuard,
    ) -> Result<u64> {
        let mut connection = Connection::new(
            stream,
            FrameCodec::new(config.max_frame_size),
            config.idle_timeout,
            config.write_timeout,
        );
        let mut exchanges = 0;

        loop {
            // Cancellation must also reach a handler stuck writing to a peer that never reads
            let exchange = async {
                let Some(payload) = connection.read_frame().await? else {
                    return Ok::<_, EchoError>(false);
                };

                let message = std::str::from_utf8(&payload)?;
                let response = frame::respond(message);
                connection.write_frame(response.as_bytes()).await?;

                debug!(request_size = payload.len(), response_size = response.len(), "Echoed frame");
                Ok(true)
            };

            tokio::select! {
                result = exchange => {
                    if !result? {
                        debug!("Client closed connection");
                        return Ok(exchanges);
                    }
                    exchanges += 1;
                }
                _ = guard.cancelled() => {
                    info!("Connection cancelled");
                    return Ok(exchanges);
                }
            }
        }
    }
}

#[async_trait]
impl<P: StreamProtocol> EchoServerTrait for StreamEchoServer<P> {
    /// Binds and runs the server until shutdown
    async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn external_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

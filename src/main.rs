use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use framecho::frame::DEFAULT_MAX_FRAME_SIZE;
use framecho::stream::StreamConfig;
use framecho::{EchoServerTrait, TcpEchoServer};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Length-prefixed TCP echo server
#[derive(Parser, Debug)]
#[command(name = "framecho", version, about, long_about = None)]
struct Args {
    /// Interface to listen on
    #[arg(long, env = "FRAMECHO_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "FRAMECHO_PORT", default_value_t = 8080)]
    port: u16,

    /// Largest accepted request payload in bytes
    #[arg(long, env = "FRAMECHO_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,

    /// Seconds to wait for the next bytes of a frame before closing the connection
    #[arg(long, env = "FRAMECHO_IDLE_TIMEOUT", default_value_t = 30)]
    idle_timeout: u64,

    /// Seconds allowed for writing one response
    #[arg(long, env = "FRAMECHO_WRITE_TIMEOUT", default_value_t = 30)]
    write_timeout: u64,

    /// Maximum number of concurrent connections
    #[arg(long, env = "FRAMECHO_MAX_CONNECTIONS", default_value_t = 1024)]
    max_connections: usize,

    /// Listen backlog
    #[arg(long, env = "FRAMECHO_BACKLOG", default_value_t = 1024)]
    backlog: u32,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn stream_config(&self) -> StreamConfig {
        StreamConfig::new(SocketAddr::new(self.host, self.port))
            .with_max_frame_size(self.max_frame_size)
            .with_idle_timeout(Duration::from_secs(self.idle_timeout))
            .with_write_timeout(Duration::from_secs(self.write_timeout))
            .with_max_connections(self.max_connections)
            .with_backlog(self.backlog)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("framecho={}", args.log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.stream_config();
    info!(
        address = %config.bind_addr,
        max_connections = config.max_connections,
        max_frame_size = config.max_frame_size,
        "Starting framed TCP echo server"
    );

    let server = TcpEchoServer::new(config);
    server.run().await.wrap_err("Failed to run TCP echo server")?;

    Ok(())
}

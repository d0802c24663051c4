//! Resource management components

pub mod limits;

pub use limits::{ClientInfo, ConnectionError, ConnectionGuard, ConnectionMetrics, ConnectionTracker};

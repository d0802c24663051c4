//! Stream-based echo server and client functionality
//!
//! This module provides a generic framed echo server and client that can work
//! with any stream transport implementing [`StreamProtocol`].

pub mod client;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;

pub use client::{Client, ClientConfig, ClientConfigBuilder};
pub use config::StreamConfig;
pub use connection::Connection;
pub use protocol::StreamProtocol;
pub use server::StreamEchoServer;

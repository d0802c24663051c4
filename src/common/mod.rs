//! Common traits and helpers used across the framecho library

pub mod test_utils;
pub mod traits;

pub use test_utils::{create_controlled_test_server_with_limit, spawn_test_server, TestServer};
pub use traits::{EchoClient, EchoServerTrait};

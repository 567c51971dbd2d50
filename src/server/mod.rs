//! Chat server
//!
//! One task per accepted connection. Each task admits itself through the
//! shared [`SessionRegistry`](crate::registry::SessionRegistry), serves its
//! client, and removes itself on the way out.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::{AddressFamily, ServerConfig};
pub use connection::Connection;
pub use listener::ChatServer;

//! Chat client
//!
//! Mirrors the server protocol from the participant's side: a command
//! interpreter turns user lines into wire messages, an event interpreter
//! turns wire messages into roster updates and display lines.

pub mod command;
pub mod config;
pub mod connection;
pub mod events;
pub mod roster;

pub use command::{Command, CommandError};
pub use config::ClientConfig;
pub use connection::ChatClient;
pub use events::{EventInterpreter, Reaction};
pub use roster::RosterReplica;

//! Per-connection session state

pub mod state;

pub use state::{Action, ConnectionState};

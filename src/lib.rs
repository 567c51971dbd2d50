//! Text group chat over a length-framed TCP protocol
//!
//! A server keeps a roster of connected participants and routes chat
//! messages between them. Clients join, send broadcast or direct messages,
//! and leave.
//!
//! ```text
//!                        Arc<SessionRegistry>
//!                   ┌──────────────────────────┐
//!                   │ sessions: Vec<Session {  │
//!                   │   id, outbound: mpsc::Tx,│
//!                   │   phase: watch::Tx,      │
//!                   │ }>                       │
//!                   └────────────┬─────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        ▼                       ▼                       ▼
//!   [Connection 1]          [Connection 2]          [Connection 3]
//!   decode → dispatch       outbound.recv()         outbound.recv()
//!        │                       │                       │
//!        └──► registry.broadcast()──► try_send ──► FramedWrite ──► TCP
//! ```
//!
//! # Wire format
//!
//! Every frame is a 4-byte big-endian length followed by ASCII message text
//! such as `REQ_ADD`, `RES_LIST(1,2)` or `MSG(1,NULL,"[12:30]hello")`.
//! See [`protocol`] for the full grammar.

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use client::{ChatClient, ClientConfig};
pub use error::{Error, Result};
pub use protocol::{ErrorCode, ParticipantId, WireMessage};
pub use registry::{RegistryConfig, SessionRegistry};
pub use server::{ChatServer, ServerConfig};

//! Session registry and broadcast routing
//!
//! The registry is the only shared mutable state on the server. Each
//! connection task admits itself, routes through the registry, and removes
//! itself when it stops.
//!
//! ```text
//!                     Arc<SessionRegistry>
//!                ┌───────────────────────────┐
//!                │ RwLock<Vec<Arc<Session>>> │
//!                │ last_id: u64              │
//!                └─────────────┬─────────────┘
//!                              │ members() snapshot
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//!    session.deliver()   session.deliver()   session.deliver()
//!     (try_send)          (try_send)          (try_send)
//!          │                   │                   │
//!     owning task         owning task         owning task ──► socket
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod router;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{DeliveryError, Outbound, Session, SessionPhase};
pub use error::RegistryError;
pub use router::BroadcastReport;
pub use store::{Admission, SessionRegistry};

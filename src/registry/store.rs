//! Session registry implementation
//!
//! The authoritative roster. Every operation takes the lock for the length
//! of one scan or mutation and never across socket I/O.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::RegistryConfig;
use super::entry::{Outbound, Session};
use super::error::RegistryError;
use crate::protocol::ParticipantId;

/// Result of a successful admission
#[derive(Debug)]
pub struct Admission {
    /// The new session, already registered
    pub session: Arc<Session>,

    /// Queue the admitted connection drains into its socket
    pub outbound: Outbound,

    /// Roster at the instant of admission, new ID last
    pub roster: Vec<ParticipantId>,
}

struct Inner {
    /// Insertion order is admission order
    sessions: Vec<Arc<Session>>,

    /// Last ID handed out; IDs start at 1 and never repeat
    last_id: u64,
}

/// Central registry of all admitted participants
///
/// Thread-safe via `RwLock`. Lookups, snapshots and broadcasts share the
/// read side; admission and removal take the write side.
pub struct SessionRegistry {
    inner: RwLock<Inner>,

    /// Configuration
    config: RegistryConfig,
}

impl SessionRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                sessions: Vec::new(),
                last_id: 0,
            }),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Maximum number of participants
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Admit a new participant
    ///
    /// Fails with [`RegistryError::Full`] at capacity; the ID counter is not
    /// advanced in that case.
    pub async fn admit(&self) -> Result<Admission, RegistryError> {
        let mut inner = self.inner.write().await;

        if inner.sessions.len() >= self.config.capacity {
            tracing::info!(
                capacity = self.config.capacity,
                "Admission refused, registry full"
            );
            return Err(RegistryError::Full {
                capacity: self.config.capacity,
            });
        }

        inner.last_id += 1;
        let id = ParticipantId::new(inner.last_id);
        let (session, outbound) = Session::new(id, self.config.outbound_queue);
        let session = Arc::new(session);

        inner.sessions.push(Arc::clone(&session));
        let roster = inner.sessions.iter().map(|s| s.id()).collect();

        tracing::info!(
            session_id = %id,
            participants = inner.sessions.len(),
            "Participant admitted"
        );

        Ok(Admission {
            session,
            outbound,
            roster,
        })
    }

    /// Find a session by ID
    pub async fn lookup(&self, id: ParticipantId) -> Option<Arc<Session>> {
        let inner = self.inner.read().await;
        inner.sessions.iter().find(|s| s.id() == id).cloned()
    }

    /// Remove a session, returning it if it was registered
    pub async fn remove(&self, id: ParticipantId) -> Option<Arc<Session>> {
        let mut inner = self.inner.write().await;
        let pos = inner.sessions.iter().position(|s| s.id() == id)?;
        let session = inner.sessions.remove(pos);

        tracing::info!(
            session_id = %id,
            participants = inner.sessions.len(),
            "Participant removed"
        );

        Some(session)
    }

    /// Registered IDs in admission order, as of one point in time
    pub async fn snapshot(&self) -> Vec<ParticipantId> {
        let inner = self.inner.read().await;
        inner.sessions.iter().map(|s| s.id()).collect()
    }

    /// Registered sessions in admission order, as of one point in time
    pub async fn members(&self) -> Vec<Arc<Session>> {
        self.inner.read().await.sessions.clone()
    }

    /// Number of registered participants
    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// True when nobody is registered
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.sessions.is_empty()
    }

    /// Ask every registered session to close
    ///
    /// Returns how many sessions were signalled. Each owning connection
    /// removes its own entry as it stops.
    pub async fn close_all(&self) -> usize {
        let members = self.members().await;
        for session in &members {
            session.request_close();
        }
        members.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

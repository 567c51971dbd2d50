//! Client-side roster replica
//!
//! Seeded once from the `RES_LIST` received at join time and kept up to
//! date from join and leave notices. The server's registry stays the
//! source of truth; this copy only drives `list users`.

use crate::protocol::ParticipantId;

/// Local copy of the participant list, in admission order
#[derive(Debug, Clone, Default)]
pub struct RosterReplica {
    ids: Vec<ParticipantId>,
    seeded: bool,
}

impl RosterReplica {
    /// Create an empty, unseeded replica
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the initial snapshot. Only the first call has any effect.
    pub fn seed(&mut self, ids: Vec<ParticipantId>) -> bool {
        if self.seeded {
            return false;
        }
        self.ids = ids;
        self.seeded = true;
        true
    }

    /// Whether the initial snapshot has been loaded
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Record a join; duplicates are ignored
    pub fn insert(&mut self, id: ParticipantId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    /// Record a leave
    pub fn remove(&mut self, id: ParticipantId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&known| known != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[ParticipantId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Most recent admission in the snapshot
    pub fn newest(&self) -> Option<ParticipantId> {
        self.ids.last().copied()
    }

    /// Space-separated labels, e.g. `01 02 05`
    pub fn listing(&self) -> String {
        self.ids
            .iter()
            .map(|id| id.label())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

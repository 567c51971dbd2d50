//! Registry error types

use crate::protocol::{ErrorCode, ParticipantId};

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Registry is at capacity
    #[error("registry full ({capacity} participants)")]
    Full { capacity: usize },

    /// No session with that ID is registered
    #[error("participant {0} not found")]
    NotFound(ParticipantId),
}

impl RegistryError {
    /// Code to report to the requesting client
    ///
    /// `NotFound` maps to the sender code; the receiver code is chosen by
    /// the caller when the missing ID was a message recipient.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            RegistryError::Full { .. } => ErrorCode::CapacityExceeded,
            RegistryError::NotFound(_) => ErrorCode::SenderNotFound,
        }
    }
}

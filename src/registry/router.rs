//! Broadcast routing
//!
//! Fan-out takes a snapshot of the membership under the read lock, drops
//! the lock, then enqueues to each member. A recipient whose queue is full
//! or closed is logged and skipped; the rest still receive the message.
//! Nothing is retried.

use super::entry::DeliveryError;
use super::store::SessionRegistry;
use crate::protocol::{ParticipantId, WireMessage};

/// Outcome of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients the message was queued for
    pub delivered: Vec<ParticipantId>,
    /// Recipients that could not take the message
    pub failed: Vec<(ParticipantId, DeliveryError)>,
}

impl BroadcastReport {
    /// Number of recipients in the snapshot
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

impl SessionRegistry {
    /// Send `message` to every registered participant except `except`
    pub async fn broadcast(&self, message: &WireMessage, except: ParticipantId) -> BroadcastReport {
        let members = self.members().await;
        let mut report = BroadcastReport::default();

        for session in members.iter().filter(|s| s.id() != except) {
            match session.deliver(message.clone()) {
                Ok(()) => report.delivered.push(session.id()),
                Err(e) => {
                    tracing::warn!(
                        session_id = %session.id(),
                        message = message.name(),
                        error = ?e,
                        "Broadcast delivery failed"
                    );
                    report.failed.push((session.id(), e));
                }
            }
        }

        tracing::debug!(
            message = message.name(),
            except = %except,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Broadcast"
        );

        report
    }

    /// Deliver `message` to one participant
    ///
    /// Returns `None` when `to` is not registered.
    pub async fn send_to(
        &self,
        to: ParticipantId,
        message: WireMessage,
    ) -> Option<Result<(), DeliveryError>> {
        let session = self.lookup(to).await?;
        let result = session.deliver(message);
        if let Err(e) = result {
            tracing::warn!(session_id = %to, error = ?e, "Direct delivery failed");
        }
        Some(result)
    }
}

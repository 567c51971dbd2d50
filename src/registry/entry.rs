//! Session entry and phase types
//!
//! This module defines the per-participant record stored in the registry.

use std::time::Instant;

use tokio::sync::{mpsc, watch};

use crate::protocol::{ParticipantId, WireMessage};

/// Lifecycle phase of a registered session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionPhase {
    /// ID allocated, entry inserted
    Admitted,
    /// Roster sent, taking part in routing
    Active,
    /// Close requested; the owning connection will stop on its next turn
    Closing,
    /// Owning connection has stopped
    Terminated,
}

/// Why a single delivery failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// Recipient's outbound queue is full (slow reader)
    QueueFull,
    /// Recipient's connection is gone
    Closed,
}

/// Receiving half of a session's outbound queue, owned by its connection
pub type Outbound = mpsc::Receiver<WireMessage>;

/// Entry for a single participant in the registry
///
/// The connection that was admitted owns the socket. Everyone else reaches
/// it through [`Session::deliver`], which only enqueues, so no caller ever
/// performs socket I/O on another participant's behalf.
#[derive(Debug)]
pub struct Session {
    id: ParticipantId,
    outbound: mpsc::Sender<WireMessage>,
    phase: watch::Sender<SessionPhase>,
    admitted_at: Instant,
}

impl Session {
    pub(super) fn new(id: ParticipantId, queue_depth: usize) -> (Self, Outbound) {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let (phase, _) = watch::channel(SessionPhase::Admitted);

        let session = Self {
            id,
            outbound: tx,
            phase,
            admitted_at: Instant::now(),
        };
        (session, rx)
    }

    /// Participant ID
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Current phase
    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Watch for phase changes
    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Time since admission
    pub fn age(&self) -> std::time::Duration {
        self.admitted_at.elapsed()
    }

    /// Mark the session as taking part in routing
    pub fn activate(&self) {
        self.advance(SessionPhase::Active);
    }

    /// Ask the owning connection to stop
    ///
    /// Cooperative: the owner observes the phase change and exits its own
    /// loop. Calling this from any task is safe.
    pub fn request_close(&self) {
        self.advance(SessionPhase::Closing);
    }

    /// Record that the owning connection has stopped
    pub fn mark_terminated(&self) {
        self.advance(SessionPhase::Terminated);
    }

    /// True once a close was requested or the connection stopped
    pub fn is_closing(&self) -> bool {
        self.phase() >= SessionPhase::Closing
    }

    /// Queue a message for this participant without waiting
    pub fn deliver(&self, message: WireMessage) -> Result<(), DeliveryError> {
        if self.phase() == SessionPhase::Terminated {
            return Err(DeliveryError::Closed);
        }
        self.outbound.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    // Phases only move forward
    fn advance(&self, to: SessionPhase) {
        self.phase.send_if_modified(|phase| {
            if *phase < to {
                *phase = to;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_only_moves_forward() {
        let (session, _rx) = Session::new(ParticipantId::new(1), 4);
        assert_eq!(session.phase(), SessionPhase::Admitted);

        session.activate();
        assert_eq!(session.phase(), SessionPhase::Active);

        session.request_close();
        assert!(session.is_closing());

        session.activate();
        assert_eq!(session.phase(), SessionPhase::Closing);

        session.mark_terminated();
        session.request_close();
        assert_eq!(session.phase(), SessionPhase::Terminated);
    }

    #[tokio::test]
    async fn test_close_request_wakes_watcher() {
        let (session, _rx) = Session::new(ParticipantId::new(1), 4);
        session.activate();
        let mut watcher = session.watch_phase();

        session.request_close();

        watcher.changed().await.unwrap();
        assert_eq!(*watcher.borrow(), SessionPhase::Closing);
    }

    #[test]
    fn test_deliver_reports_full_and_closed() {
        let (session, mut rx) = Session::new(ParticipantId::new(1), 1);

        assert!(session.deliver(WireMessage::ReqList).is_ok());
        assert_eq!(
            session.deliver(WireMessage::ReqList),
            Err(DeliveryError::QueueFull)
        );

        assert_eq!(rx.try_recv().unwrap(), WireMessage::ReqList);
        drop(rx);
        assert_eq!(
            session.deliver(WireMessage::ReqList),
            Err(DeliveryError::Closed)
        );
    }

    #[test]
    fn test_no_delivery_after_termination() {
        let (session, _rx) = Session::new(ParticipantId::new(1), 4);
        session.mark_terminated();

        assert_eq!(
            session.deliver(WireMessage::ReqList),
            Err(DeliveryError::Closed)
        );
    }
}

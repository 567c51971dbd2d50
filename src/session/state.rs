//! Server-side session state machine
//!
//! Decides what a connection should do with each decoded message. The
//! connection task carries out the resulting [`Action`]; this module does
//! no I/O.
//!
//! ```text
//!   AwaitJoin ──REQ_ADD──► Active(id) ──REQ_REM(id) / error──► Terminated
//!       │                                                          ▲
//!       └──────────── anything else / capacity refusal ────────────┘
//! ```

use crate::protocol::{ErrorCode, ParticipantId, WireMessage};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connected, waiting for `REQ_ADD`
    AwaitJoin,
    /// Admitted under the given ID
    Active(ParticipantId),
    /// Finished; nothing further is processed
    Terminated,
}

/// What the connection must do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Ask the registry for admission
    Admit,

    /// Route a chat message; `receiver: None` fans out to everyone else
    Route {
        receiver: Option<ParticipantId>,
        message: WireMessage,
    },

    /// Answer the sender only
    Reply(WireMessage),

    /// Send the sender a fresh roster
    SendRoster,

    /// Sender removes itself
    Leave,

    /// Protocol violation; close the connection
    Violation(String),
}

impl ConnectionState {
    /// Create a new state machine
    pub fn new() -> Self {
        ConnectionState::AwaitJoin
    }

    /// ID once admitted
    pub fn participant(&self) -> Option<ParticipantId> {
        match self {
            ConnectionState::Active(id) => Some(*id),
            _ => None,
        }
    }

    /// Admission succeeded
    pub fn activate(&mut self, id: ParticipantId) {
        if *self == ConnectionState::AwaitJoin {
            *self = ConnectionState::Active(id);
        }
    }

    /// Connection is done
    pub fn terminate(&mut self) {
        *self = ConnectionState::Terminated;
    }

    /// Check if terminated
    pub fn is_terminated(&self) -> bool {
        *self == ConnectionState::Terminated
    }

    /// Decide how to handle `message` in the current state
    pub fn on_message(&self, message: WireMessage) -> Action {
        match *self {
            ConnectionState::AwaitJoin => match message {
                WireMessage::ReqAdd => Action::Admit,
                other => Action::Violation(format!("{} before REQ_ADD", other.name())),
            },
            ConnectionState::Active(me) => Self::on_active(me, message),
            ConnectionState::Terminated => {
                Action::Violation(format!("{} after termination", message.name()))
            }
        }
    }

    fn on_active(me: ParticipantId, message: WireMessage) -> Action {
        match message {
            WireMessage::Msg { author, .. } if author != me => {
                Action::Reply(WireMessage::Error(ErrorCode::SenderNotFound))
            }
            WireMessage::Msg { receiver, .. } => Action::Route { receiver, message },

            // Removal is self-removal only
            WireMessage::ReqRem(id) if id != me => {
                Action::Reply(WireMessage::Error(ErrorCode::SenderNotFound))
            }
            WireMessage::ReqRem(_) => Action::Leave,

            WireMessage::ReqList => Action::SendRoster,
            WireMessage::ReqAdd => Action::Violation("REQ_ADD after admission".into()),

            // Server-to-client messages are never valid from a client
            other @ (WireMessage::ResList(_) | WireMessage::Ok(_) | WireMessage::Error(_)) => {
                Action::Violation(format!("client sent {}", other.name()))
            }
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ParticipantId {
        ParticipantId::new(n)
    }

    fn chat(author: u64, receiver: Option<u64>) -> WireMessage {
        WireMessage::Msg {
            author: id(author),
            receiver: receiver.map(id),
            text: "[10:00]hi".into(),
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let mut state = ConnectionState::new();
        assert_eq!(state.on_message(WireMessage::ReqAdd), Action::Admit);

        state.activate(id(4));
        assert_eq!(state.participant(), Some(id(4)));
        assert_eq!(state.on_message(WireMessage::ReqRem(id(4))), Action::Leave);

        state.terminate();
        assert!(state.is_terminated());
        assert!(matches!(
            state.on_message(chat(4, None)),
            Action::Violation(_)
        ));
    }

    #[test]
    fn test_first_message_must_be_join() {
        let state = ConnectionState::new();

        assert!(matches!(
            state.on_message(chat(1, None)),
            Action::Violation(_)
        ));
        assert!(matches!(
            state.on_message(WireMessage::ReqList),
            Action::Violation(_)
        ));
    }

    #[test]
    fn test_routing_decisions() {
        let mut state = ConnectionState::new();
        state.activate(id(1));

        assert_eq!(
            state.on_message(chat(1, None)),
            Action::Route {
                receiver: None,
                message: chat(1, None)
            }
        );
        assert_eq!(
            state.on_message(chat(1, Some(2))),
            Action::Route {
                receiver: Some(id(2)),
                message: chat(1, Some(2))
            }
        );
        assert_eq!(state.on_message(WireMessage::ReqList), Action::SendRoster);
    }

    #[test]
    fn test_impersonation_rejected() {
        let mut state = ConnectionState::new();
        state.activate(id(1));

        let reject = Action::Reply(WireMessage::Error(ErrorCode::SenderNotFound));
        assert_eq!(state.on_message(chat(2, None)), reject);
        assert_eq!(state.on_message(WireMessage::ReqRem(id(2))), reject);
    }

    #[test]
    fn test_server_messages_from_client_are_violations() {
        let mut state = ConnectionState::new();
        state.activate(id(1));

        for msg in [
            WireMessage::ReqAdd,
            WireMessage::Ok(id(1)),
            WireMessage::ResList(vec![id(1)]),
            WireMessage::Error(ErrorCode::CapacityExceeded),
        ] {
            assert!(matches!(state.on_message(msg), Action::Violation(_)));
        }
    }

    #[test]
    fn test_activate_only_from_await_join() {
        let mut state = ConnectionState::new();
        state.activate(id(1));
        state.activate(id(2));
        assert_eq!(state.participant(), Some(id(1)));

        state.terminate();
        state.activate(id(3));
        assert!(state.is_terminated());
    }
}

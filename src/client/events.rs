//! Server event interpreter
//!
//! Maps each inbound [`WireMessage`] to a roster update and the line to
//! show the user.

use crate::protocol::{ParticipantId, WireMessage};

use super::roster::RosterReplica;

/// What the client should do after an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Show a line and keep going
    Print(String),
    /// Nothing to show
    Ignore,
    /// Our own removal completed: show the line, then shut down
    Leave(String),
}

/// Interprets server events for one participant
#[derive(Debug, Clone, Copy)]
pub struct EventInterpreter {
    me: ParticipantId,
}

impl EventInterpreter {
    pub fn new(me: ParticipantId) -> Self {
        Self { me }
    }

    /// Apply `message` to `roster` and decide what to show
    pub fn apply(&self, message: WireMessage, roster: &mut RosterReplica) -> Reaction {
        if let Some(joined) = message.joined_id() {
            roster.insert(joined);
            return Reaction::Print(joined_line(joined));
        }

        match message {
            WireMessage::Msg {
                author,
                receiver,
                text,
            } => Reaction::Print(chat_line(self.me, author, receiver, &text)),

            WireMessage::Error(code) => Reaction::Print(code.reason().to_string()),

            WireMessage::Ok(id) if id == self.me => Reaction::Leave(left_line(id)),

            WireMessage::ReqRem(id) if id != self.me => {
                roster.remove(id);
                Reaction::Print(left_line(id))
            }

            WireMessage::ResList(ids) => {
                if !roster.seed(ids) {
                    tracing::debug!("Ignoring roster snapshot after startup");
                }
                Reaction::Ignore
            }

            other => {
                tracing::debug!(message = other.name(), "Ignoring server message");
                Reaction::Ignore
            }
        }
    }
}

/// `User 03 joined the group!`
pub fn joined_line(id: ParticipantId) -> String {
    format!("User {} joined the group!", id.label())
}

/// `User 03 left the group!`
pub fn left_line(id: ParticipantId) -> String {
    format!("User {} left the group!", id.label())
}

/// Render a chat payload
///
/// Our own broadcasts show as `HH:MM -> all text`, everything else as
/// `HH:MM 02: text`. Payloads without a `[HH:MM]` stamp are shown whole.
pub fn chat_line(
    me: ParticipantId,
    author: ParticipantId,
    receiver: Option<ParticipantId>,
    text: &str,
) -> String {
    let (time, body) = split_stamp(text);
    let prefix = if time.is_empty() {
        String::new()
    } else {
        format!("{} ", time)
    };

    if receiver.is_none() && author == me {
        format!("{}-> all {}", prefix, body)
    } else {
        format!("{}{}: {}", prefix, author.label(), body)
    }
}

fn split_stamp(text: &str) -> (&str, &str) {
    text.strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .unwrap_or(("", text))
}

//! Local command interpreter
//!
//! Turns one line of user input into a [`Command`], and a command into the
//! wire message it sends (if any).
//!
//! ```text
//! close connection
//! list users
//! send all "<text>"
//! send to <id> "<text>"
//! ```

use std::str::FromStr;

use crate::protocol::{ParticipantId, WireMessage};

/// A recognised user command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the group
    Close,
    /// Print the local roster
    List,
    /// Message everyone
    SendAll(String),
    /// Message one participant
    SendTo(ParticipantId, String),
}

/// Why a line was not a command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command")]
    Unknown,
    #[error("message text must be enclosed in double quotes")]
    MissingText,
    #[error("invalid receiver {0:?}")]
    BadReceiver(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);

        match line {
            "close connection" => return Ok(Command::Close),
            "list users" => return Ok(Command::List),
            _ => {}
        }

        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("send"), Some("all")) => Ok(Command::SendAll(quoted_text(line)?)),
            (Some("send"), Some("to")) => {
                let raw = words.next().ok_or(CommandError::MissingText)?;
                let id = match raw.parse::<u64>() {
                    Ok(n) if n > 0 => ParticipantId::new(n),
                    _ => return Err(CommandError::BadReceiver(raw.to_string())),
                };
                Ok(Command::SendTo(id, quoted_text(line)?))
            }
            _ => Err(CommandError::Unknown),
        }
    }
}

impl Command {
    /// Wire message for this command, stamped with `time` (`HH:MM`)
    ///
    /// `List` is purely local and yields `None`.
    pub fn to_wire(&self, me: ParticipantId, time: &str) -> Option<WireMessage> {
        match self {
            Command::Close => Some(WireMessage::ReqRem(me)),
            Command::List => None,
            Command::SendAll(text) => Some(WireMessage::Msg {
                author: me,
                receiver: None,
                text: stamp(time, text),
            }),
            Command::SendTo(to, text) => Some(WireMessage::Msg {
                author: me,
                receiver: Some(*to),
                text: stamp(time, text),
            }),
        }
    }
}

/// Prefix chat text with `[HH:MM]`
pub fn stamp(time: &str, text: &str) -> String {
    format!("[{}]{}", time, text)
}

/// Everything between the first and last double quote on the line
fn quoted_text(line: &str) -> Result<String, CommandError> {
    let open = line.find('"').ok_or(CommandError::MissingText)?;
    let close = line.rfind('"').ok_or(CommandError::MissingText)?;
    if close <= open + 1 {
        return Err(CommandError::MissingText);
    }
    Ok(line[open + 1..close].to_string())
}

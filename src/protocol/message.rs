//! Wire message types
//!
//! A [`WireMessage`] is the decoded form of one frame. Its [`Display`]
//! implementation produces the exact wire text, so `msg.to_string()` is the
//! encoder and [`WireMessage::decode`] is the inverse.
//!
//! [`Display`]: std::fmt::Display

use std::fmt;

use super::constants::*;
use super::parser::{self, ParseError};

/// Participant identifier assigned by the server
///
/// Always positive. Never reused during the lifetime of a server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(u64);

impl ParticipantId {
    /// Wrap a raw ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric value
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Zero-padded form used in chat output (`01`, `02`, ...)
    pub fn label(self) -> String {
        format!("{:02}", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ParticipantId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Reason carried by an `ERROR(code)` message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Registry is at capacity
    CapacityExceeded = 1,
    /// Sender (or removal target) is not registered
    SenderNotFound = 2,
    /// Direct-message receiver is not registered
    ReceiverNotFound = 3,
}

impl ErrorCode {
    /// Numeric code as sent on the wire
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a code received from the wire
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(ErrorCode::CapacityExceeded),
            2 => Some(ErrorCode::SenderNotFound),
            3 => Some(ErrorCode::ReceiverNotFound),
            _ => None,
        }
    }

    /// Human-readable reason shown to the user
    pub fn reason(self) -> &'static str {
        match self {
            ErrorCode::CapacityExceeded => "User limit exceeded",
            ErrorCode::SenderNotFound => "User not found",
            ErrorCode::ReceiverNotFound => "Receiver not found",
        }
    }
}

/// One decoded protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    /// Client asks to be admitted
    ReqAdd,

    /// Client asks for a fresh roster snapshot
    ReqList,

    /// Removal request (client to server) or leave notice (server to clients)
    ReqRem(ParticipantId),

    /// Roster snapshot, oldest admission first
    ResList(Vec<ParticipantId>),

    /// Chat payload. `receiver: None` is a broadcast (`NULL` on the wire).
    Msg {
        author: ParticipantId,
        receiver: Option<ParticipantId>,
        text: String,
    },

    /// Removal of the given ID completed
    Ok(ParticipantId),

    /// Request failed
    Error(ErrorCode),
}

impl WireMessage {
    /// Decode message text (the body of one frame)
    pub fn decode(text: &str) -> Result<Self, ParseError> {
        parser::decode(text)
    }

    /// Encode to message text
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Command name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            WireMessage::ReqAdd => CMD_REQ_ADD,
            WireMessage::ReqList => CMD_REQ_LIST,
            WireMessage::ReqRem(_) => CMD_REQ_REM,
            WireMessage::ResList(_) => CMD_RES_LIST,
            WireMessage::Msg { .. } => CMD_MSG,
            WireMessage::Ok(_) => CMD_OK,
            WireMessage::Error(_) => CMD_ERROR,
        }
    }

    /// The notice broadcast when `id` is admitted
    pub fn join_notice(id: ParticipantId) -> Self {
        WireMessage::Msg {
            author: id,
            receiver: None,
            text: join_notice_text(id),
        }
    }

    /// If this is a join notice, the ID that joined
    ///
    /// Only the exact notice text for the author counts. Chat text sent by
    /// clients is `[HH:MM]`-stamped and can never match.
    pub fn joined_id(&self) -> Option<ParticipantId> {
        match self {
            WireMessage::Msg {
                author,
                receiver: None,
                text,
            } if *text == join_notice_text(*author) => Some(*author),
            _ => None,
        }
    }
}

fn join_notice_text(id: ParticipantId) -> String {
    format!("User {} {}", id, JOIN_NOTICE_SUFFIX)
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireMessage::ReqAdd | WireMessage::ReqList => f.write_str(self.name()),
            WireMessage::ReqRem(id) | WireMessage::Ok(id) => {
                write!(f, "{}({})", self.name(), id)
            }
            WireMessage::ResList(ids) => {
                write!(f, "{}(", self.name())?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", id)?;
                }
                f.write_str(")")
            }
            WireMessage::Msg {
                author,
                receiver,
                text,
            } => {
                write!(f, "{}({},", self.name(), author)?;
                match receiver {
                    Some(id) => write!(f, "{},", id)?,
                    None => write!(f, "{},", NULL_RECEIVER)?,
                }
                f.write_str("\"")?;
                for c in text.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\")")
            }
            WireMessage::Error(code) => write!(f, "{}({})", self.name(), code.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ParticipantId {
        ParticipantId::new(n)
    }

    #[test]
    fn test_encode_simple_commands() {
        assert_eq!(WireMessage::ReqAdd.encode(), "REQ_ADD");
        assert_eq!(WireMessage::ReqList.encode(), "REQ_LIST");
        assert_eq!(WireMessage::ReqRem(id(4)).encode(), "REQ_REM(4)");
        assert_eq!(WireMessage::Ok(id(1)).encode(), "OK(1)");
        assert_eq!(
            WireMessage::Error(ErrorCode::ReceiverNotFound).encode(),
            "ERROR(3)"
        );
    }

    #[test]
    fn test_encode_roster() {
        let msg = WireMessage::ResList(vec![id(1), id(3), id(7)]);
        assert_eq!(msg.encode(), "RES_LIST(1,3,7)");
    }

    #[test]
    fn test_encode_msg_escapes_payload() {
        let msg = WireMessage::Msg {
            author: id(2),
            receiver: None,
            text: r#"say "hi" \o/"#.into(),
        };
        assert_eq!(msg.encode(), r#"MSG(2,NULL,"say \"hi\" \\o/")"#);

        let direct = WireMessage::Msg {
            author: id(2),
            receiver: Some(id(5)),
            text: "a,b)".into(),
        };
        assert_eq!(direct.encode(), r#"MSG(2,5,"a,b)")"#);
    }

    #[test]
    fn test_join_notice() {
        let notice = WireMessage::join_notice(id(3));
        assert_eq!(notice.encode(), r#"MSG(3,NULL,"User 3 joined the group!")"#);
        assert_eq!(notice.joined_id(), Some(id(3)));

        let direct = WireMessage::Msg {
            author: id(3),
            receiver: Some(id(1)),
            text: "User 3 joined the group!".into(),
        };
        assert_eq!(direct.joined_id(), None);
    }

    #[test]
    fn test_chat_text_is_not_a_join_notice() {
        let chat = WireMessage::Msg {
            author: id(2),
            receiver: None,
            text: "[12:00]guess who just joined the group!".into(),
        };
        assert_eq!(chat.joined_id(), None);

        // Someone else's notice text under the wrong author
        let forged = WireMessage::Msg {
            author: id(2),
            receiver: None,
            text: "User 7 joined the group!".into(),
        };
        assert_eq!(forged.joined_id(), None);
    }

    #[test]
    fn test_error_codes() {
        for code in [
            ErrorCode::CapacityExceeded,
            ErrorCode::SenderNotFound,
            ErrorCode::ReceiverNotFound,
        ] {
            assert_eq!(ErrorCode::from_code(code.code() as u64), Some(code));
        }
        assert_eq!(ErrorCode::from_code(0), None);
        assert_eq!(ErrorCode::from_code(4), None);
        assert_eq!(ErrorCode::SenderNotFound.reason(), "User not found");
    }

    #[test]
    fn test_participant_label() {
        assert_eq!(id(1).label(), "01");
        assert_eq!(id(12).label(), "12");
        assert_eq!(id(12).to_string(), "12");
    }
}

//! Error types

use crate::protocol::{ErrorCode, ParseError};
use crate::registry::RegistryError;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket read or write failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer violated the wire protocol
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Registry refused an operation
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Peer closed the stream
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Server refused to admit us
    #[error("admission rejected: {}", .0.reason())]
    Rejected(ErrorCode),
}

/// Wire protocol violations. All of them are fatal to the connection that
/// produced them.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame text did not match the message grammar
    #[error("malformed message: {0}")]
    Parse(#[from] ParseError),

    /// Length prefix exceeds the configured maximum
    #[error("frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// Well-formed message arrived in a state that does not accept it
    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),
}

// The codec layer reports I/O and protocol failures through one type.
impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Protocol(ProtocolError::Parse(err))
    }
}

impl Error {
    /// True when the peer simply went away rather than misbehaving
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::ConnectionClosed => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_classification() {
        assert!(Error::ConnectionClosed.is_disconnect());
        assert!(Error::Io(std::io::ErrorKind::ConnectionReset.into()).is_disconnect());
        assert!(!Error::Rejected(ErrorCode::CapacityExceeded).is_disconnect());

        let parse: Error = ParseError::UnterminatedQuote.into();
        assert!(!parse.is_disconnect());
    }

    #[test]
    fn test_rejected_display_uses_reason() {
        let err = Error::Rejected(ErrorCode::CapacityExceeded);
        assert_eq!(err.to_string(), "admission rejected: User limit exceeded");
    }
}

//! Protocol constants

/// Default maximum number of simultaneously registered participants
pub const DEFAULT_CAPACITY: usize = 15;

/// Size of the big-endian length prefix in front of every frame
pub const FRAME_HEADER_SIZE: usize = 4;

/// Default maximum frame body size in bytes
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4096;

/// Default depth of each session's outbound queue
pub const DEFAULT_OUTBOUND_QUEUE: usize = 64;

/// Receiver sentinel meaning "everyone"
pub const NULL_RECEIVER: &str = "NULL";

/// Tail of the payload the server sends when someone joins
pub const JOIN_NOTICE_SUFFIX: &str = "joined the group!";

// Command names
pub const CMD_REQ_ADD: &str = "REQ_ADD";
pub const CMD_REQ_REM: &str = "REQ_REM";
pub const CMD_REQ_LIST: &str = "REQ_LIST";
pub const CMD_RES_LIST: &str = "RES_LIST";
pub const CMD_MSG: &str = "MSG";
pub const CMD_OK: &str = "OK";
pub const CMD_ERROR: &str = "ERROR";

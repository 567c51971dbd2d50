//! Group chat wire protocol
//!
//! | Name       | Args                                 | Meaning                          |
//! |------------|--------------------------------------|----------------------------------|
//! | `REQ_ADD`  | none                                 | client asks to be admitted       |
//! | `REQ_LIST` | none                                 | client asks for a roster refresh |
//! | `REQ_REM`  | id                                   | removal request / leave notice   |
//! | `RES_LIST` | id, id, ...                          | roster snapshot                  |
//! | `MSG`      | author, receiver or `NULL`, `"text"` | chat payload                     |
//! | `OK`       | id                                   | removal of `id` completed        |
//! | `ERROR`    | code                                 | 1 capacity, 2 sender, 3 receiver |
//!
//! Messages travel in length-prefixed frames, see [`codec`].

pub mod codec;
pub mod constants;
pub mod message;
pub mod parser;

pub use codec::ChatCodec;
pub use message::{ErrorCode, ParticipantId, WireMessage};
pub use parser::ParseError;

//! Length-prefixed frame codec
//!
//! ```text
//! +----------------+---------------------------+
//! | length (u32 BE)| message text (length bytes)|
//! +----------------+---------------------------+
//! ```
//!
//! Frame boundaries come only from the length prefix, never from how the
//! transport happens to split reads and writes.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::constants::{DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE};
use super::message::WireMessage;
use super::parser::{self, ParseError};
use crate::error::{Error, ProtocolError};

/// Codec for [`WireMessage`] frames, usable with `FramedRead`/`FramedWrite`
#[derive(Debug, Clone)]
pub struct ChatCodec {
    max_frame_size: usize,
}

impl ChatCodec {
    /// Create a codec with the default frame size limit
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a codec with a custom frame size limit
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Maximum accepted body size
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for ChatCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChatCodec {
    type Item = WireMessage;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let mut header = &src[..FRAME_HEADER_SIZE];
        let len = header.get_u32() as usize;

        if len > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
            }
            .into());
        }

        let total = FRAME_HEADER_SIZE + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER_SIZE);
        let body = src.split_to(len);
        let text = std::str::from_utf8(&body)
            .map_err(|_| ParseError::Malformed("frame is not valid UTF-8"))?;

        Ok(Some(parser::decode(text)?))
    }
}

impl Encoder<WireMessage> for ChatCodec {
    type Error = Error;

    fn encode(&mut self, item: WireMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let text = item.encode();
        if text.len() > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: text.len(),
                max: self.max_frame_size,
            }
            .into());
        }

        dst.reserve(FRAME_HEADER_SIZE + text.len());
        dst.put_u32(text.len() as u32);
        dst.put_slice(text.as_bytes());
        Ok(())
    }
}

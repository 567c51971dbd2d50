//! Message text parser
//!
//! Grammar: `NAME` or `NAME(arg1,...,argN)`.
//!
//! Bare arguments are split on commas. For `MSG` only the first two
//! arguments are split that way; whatever follows the second comma must be
//! a quoted string running to the frame's final `")`. The payload is
//! everything between that opening quote and the closing one, so commas,
//! parentheses and quotes inside it can never move an argument boundary.
//! Inside the payload `\"` and `\\` are escapes.

use super::constants::*;
use super::message::{ErrorCode, ParticipantId, WireMessage};

/// Why a frame's text failed to decode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("{command} expects {expected} argument(s), got {found}")]
    WrongArity {
        command: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("unknown error code {0}")]
    UnknownErrorCode(u64),

    #[error("unterminated quoted payload")]
    UnterminatedQuote,

    #[error("{0}")]
    Malformed(&'static str),
}

/// Decode one message
pub fn decode(text: &str) -> Result<WireMessage, ParseError> {
    if text.is_empty() {
        return Err(ParseError::Malformed("empty message"));
    }

    let (name, body) = split_name(text)?;

    match name {
        CMD_REQ_ADD => {
            expect_no_args(CMD_REQ_ADD, body)?;
            Ok(WireMessage::ReqAdd)
        }
        CMD_REQ_LIST => {
            expect_no_args(CMD_REQ_LIST, body)?;
            Ok(WireMessage::ReqList)
        }
        CMD_REQ_REM => {
            let id = single_arg(CMD_REQ_REM, body)?;
            Ok(WireMessage::ReqRem(parse_id(id)?))
        }
        CMD_OK => {
            let id = single_arg(CMD_OK, body)?;
            Ok(WireMessage::Ok(parse_id(id)?))
        }
        CMD_ERROR => {
            let raw = parse_number(single_arg(CMD_ERROR, body)?)?;
            let code = ErrorCode::from_code(raw).ok_or(ParseError::UnknownErrorCode(raw))?;
            Ok(WireMessage::Error(code))
        }
        CMD_RES_LIST => {
            let args = bare_args(body.unwrap_or(""))?;
            if body.is_none() || args.is_empty() {
                return Err(ParseError::WrongArity {
                    command: CMD_RES_LIST,
                    expected: "1 or more",
                    found: 0,
                });
            }
            let ids = args
                .into_iter()
                .map(parse_id)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(WireMessage::ResList(ids))
        }
        CMD_MSG => decode_msg(body),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Split `NAME(...)` into the name and the text between the parentheses.
fn split_name(text: &str) -> Result<(&str, Option<&str>), ParseError> {
    match text.find('(') {
        None => {
            if text.contains(')') {
                return Err(ParseError::Malformed("unbalanced parenthesis"));
            }
            Ok((text, None))
        }
        Some(open) => {
            let inner = text[open + 1..]
                .strip_suffix(')')
                .ok_or(ParseError::Malformed("missing closing parenthesis"))?;
            Ok((&text[..open], Some(inner)))
        }
    }
}

fn expect_no_args(command: &'static str, body: Option<&str>) -> Result<(), ParseError> {
    match body {
        None => Ok(()),
        Some(inner) => Err(ParseError::WrongArity {
            command,
            expected: "0",
            found: bare_args(inner)?.len(),
        }),
    }
}

fn single_arg<'a>(command: &'static str, body: Option<&'a str>) -> Result<&'a str, ParseError> {
    let args = bare_args(body.unwrap_or(""))?;
    match (body, args.as_slice()) {
        (Some(_), [arg]) => Ok(*arg),
        _ => Err(ParseError::WrongArity {
            command,
            expected: "1",
            found: if body.is_some() { args.len() } else { 0 },
        }),
    }
}

/// Split unquoted arguments. `""` yields no arguments.
fn bare_args(inner: &str) -> Result<Vec<&str>, ParseError> {
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    if inner.contains('"') {
        return Err(ParseError::Malformed("quote outside of payload argument"));
    }
    Ok(inner.split(',').collect())
}

fn decode_msg(body: Option<&str>) -> Result<WireMessage, ParseError> {
    let arity = |found| ParseError::WrongArity {
        command: CMD_MSG,
        expected: "3",
        found,
    };

    let inner = body.ok_or_else(|| arity(0))?;

    // Author and receiver end at the first two commas. Neither may contain a
    // quote, so a quote seen here means the payload came too early.
    let mut rest = inner;
    let mut head: [&str; 2] = ["", ""];
    for (i, slot) in head.iter_mut().enumerate() {
        let comma = rest.find(',').ok_or_else(|| arity(i + 1))?;
        let arg = &rest[..comma];
        if arg.contains('"') {
            return Err(arity(i + 1));
        }
        *slot = arg;
        rest = &rest[comma + 1..];
    }

    let author = parse_id(head[0])?;
    let receiver = match head[1] {
        NULL_RECEIVER => None,
        raw => Some(parse_id(raw)?),
    };
    let text = quoted_payload(rest)?;

    Ok(WireMessage::Msg {
        author,
        receiver,
        text,
    })
}

/// Extract the payload from `"..."`, where the closing quote is the last
/// character of the argument and is not itself escaped.
fn quoted_payload(arg: &str) -> Result<String, ParseError> {
    let body = arg
        .strip_prefix('"')
        .ok_or(ParseError::Malformed("payload must be quoted"))?;
    let body = body.strip_suffix('"').ok_or(ParseError::UnterminatedQuote)?;

    // An odd run of backslashes before the closing quote escapes it
    let trailing = body.bytes().rev().take_while(|&b| b == b'\\').count();
    if trailing % 2 == 1 {
        return Err(ParseError::UnterminatedQuote);
    }

    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('"' | '\\')) => text.push(escaped),
            Some(other) => {
                text.push('\\');
                text.push(other);
            }
            None => text.push('\\'),
        }
    }
    Ok(text)
}

fn parse_number(raw: &str) -> Result<u64, ParseError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidNumber(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))
}

fn parse_id(raw: &str) -> Result<ParticipantId, ParseError> {
    match parse_number(raw)? {
        0 => Err(ParseError::InvalidNumber(raw.to_string())),
        n => Ok(ParticipantId::new(n)),
    }
}

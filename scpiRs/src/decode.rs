//! Turn the raw reply to a command into a typed [`Response`] or a classified error.
//!
//! Decoding is all-or-nothing: either the whole reply fits the shape the descriptor declares, or
//! the result is an [`InstrumentError::Protocol`]. A partially parsed value is never returned.

use crate::{CommandDescriptor, InstrumentError, ReplyKind};

/// One entry of the instrument's error queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedError {
    /// Firmware error code, `0` means no error.
    pub code: i32,
    /// Firmware error message, without quotes.
    pub message: String,
}

/// A decoded value payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Free text.
    Text(String),
    /// A single mnemonic.
    Token(String),
    /// A single integer.
    Integer(i64),
    /// A single number.
    Float(f64),
    /// An ordered list of numbers.
    Floats(Vec<f64>),
    /// Entries of the error queue.
    Errors(Vec<QueuedError>),
}

impl Value {
    /// The value as a number, if it is a single number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(val) => Some(*val),
            Value::Integer(val) => Some(*val as f64),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(val) => Some(*val),
            _ => None,
        }
    }

    /// The value as a string slice, if it is text or a token.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(val) | Value::Token(val) => Some(val),
            _ => None,
        }
    }

    /// The value as a list of numbers, if it is one.
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Value::Floats(vals) => Some(vals),
            _ => None,
        }
    }
}

/// A successfully decoded reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// An action was accepted. Contains whatever text the instrument sent along, usually nothing.
    Acknowledged(String),
    /// A query returned a value.
    Value(Value),
}

impl Response {
    /// The value payload, if this is a query response.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Response::Value(val) => Some(val),
            Response::Acknowledged(_) => None,
        }
    }
}

/// Decode the reply to `descriptor`, with the prompt already removed.
///
/// # Errors
/// - [`InstrumentError::Instrument`] if a line of the reply starts with `ERROR`.
/// - [`InstrumentError::Protocol`] if the reply does not fit the declared [`ReplyKind`].
pub fn decode(descriptor: &CommandDescriptor, raw: &[u8]) -> Result<Response, InstrumentError> {
    let protocol = |reason: &str| InstrumentError::Protocol {
        command: descriptor.name.to_string(),
        response: String::from_utf8_lossy(raw).trim().to_string(),
        reason: reason.to_string(),
    };

    let text = std::str::from_utf8(raw)
        .map_err(|_| protocol("reply is not valid UTF-8"))?
        .trim();

    if let Some(err) = text.lines().find_map(parse_error_line) {
        return Err(err);
    }

    let payload = || strip_header_echo(text).ok_or_else(|| protocol("reply has no value"));
    let value = match descriptor.reply {
        ReplyKind::Ack => return Ok(Response::Acknowledged(text.to_string())),
        ReplyKind::Text => Value::Text(text.to_string()),
        ReplyKind::Token => single_field(payload()?)
            .filter(|tok| !tok.is_empty() && !tok.contains(char::is_whitespace))
            .map(|tok| Value::Token(tok.to_string()))
            .ok_or_else(|| protocol("expected a single token"))?,
        ReplyKind::Integer => single_field(payload()?)
            .and_then(strip_unit)
            .and_then(|num| num.parse::<i64>().ok())
            .map(Value::Integer)
            .ok_or_else(|| protocol("expected a single integer"))?,
        ReplyKind::Float => single_field(payload()?)
            .and_then(parse_number)
            .map(Value::Float)
            .ok_or_else(|| protocol("expected a single number"))?,
        ReplyKind::Floats => payload()?
            .split([',', ';', '\n'])
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(parse_number)
            .collect::<Option<Vec<f64>>>()
            .map(Value::Floats)
            .ok_or_else(|| protocol("expected a list of numbers"))?,
        ReplyKind::ErrorQueue => parse_error_queue(payload()?)
            .map(Value::Errors)
            .ok_or_else(|| protocol("expected `code,\"message\"` entries"))?,
    };
    Ok(Response::Value(value))
}

/// Classify a single reply line as an in-band firmware error.
///
/// Accepted forms: `ERROR`, `ERROR: message`, `ERROR -222, message`, `error:-113,"Undefined header"`.
fn parse_error_line(line: &str) -> Option<InstrumentError> {
    let line = line.trim();
    let head = line.get(..5)?;
    if !head.eq_ignore_ascii_case("ERROR") {
        return None;
    }
    let rest = line[5..].trim_start();
    let rest = rest.strip_prefix(':').unwrap_or(rest).trim_start();

    let code_len = rest
        .char_indices()
        .take_while(|(idx, c)| c.is_ascii_digit() || (*idx == 0 && (*c == '-' || *c == '+')))
        .count();
    let (code, message) = match rest[..code_len].parse::<i32>() {
        Ok(code) => (Some(code), &rest[code_len..]),
        Err(_) => (None, rest),
    };
    let message = message
        .trim_start_matches([',', ';', ':'])
        .trim()
        .trim_matches('"')
        .to_string();
    Some(InstrumentError::Instrument { code, message })
}

/// Drop an echoed command header, e.g., `:CONFigure:FIXed:WAVelength 1550` becomes `1550`.
///
/// Returns `None` if the reply is nothing but a header.
fn strip_header_echo(text: &str) -> Option<&str> {
    if text.starts_with([':', '*']) {
        text.split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
    } else {
        Some(text)
    }
}

/// The payload if it consists of exactly one comma separated field.
fn single_field(payload: &str) -> Option<&str> {
    let payload = payload.trim();
    (!payload.contains([',', ';', '\n'])).then_some(payload)
}

/// Drop a trailing unit word from a numeric field: `1550 nm` or `1550nm` become `1550`.
fn strip_unit(field: &str) -> Option<&str> {
    let mut words = field.split_whitespace();
    let num = words.next()?;
    match (words.next(), words.next()) {
        (None, _) => Some(num.trim_end_matches(is_unit_char)),
        (Some(unit), None) if unit.chars().all(is_unit_char) => Some(num),
        _ => None,
    }
}

fn is_unit_char(c: char) -> bool {
    c.is_alphabetic() || c == '%' || c == '/'
}

fn parse_number(field: &str) -> Option<f64> {
    let field = field.trim();
    // A bare number first, so that exponents like `1E+03` are not mistaken for units.
    if let Ok(val) = field.parse::<f64>() {
        return Some(val);
    }
    strip_unit(field)?.parse::<f64>().ok()
}

/// Parse `code,"message"` entries separated by commas, semicolons, or new lines.
fn parse_error_queue(payload: &str) -> Option<Vec<QueuedError>> {
    let mut entries = Vec::new();
    let mut rest = payload.trim();
    while !rest.is_empty() {
        let (code, after_code) = rest.split_once(',')?;
        let code = code.trim().parse::<i32>().ok()?;
        let after_code = after_code.trim_start();

        let (message, after_message) = match after_code.strip_prefix('"') {
            Some(quoted) => {
                let end = quoted.find('"')?;
                (&quoted[..end], &quoted[end + 1..])
            }
            None => match after_code.find([',', ';', '\n']) {
                Some(end) => (&after_code[..end], &after_code[end..]),
                None => (after_code, ""),
            },
        };
        entries.push(QueuedError {
            code,
            message: message.trim().to_string(),
        });
        rest = after_message.trim_start_matches([',', ';', '\n', '\r', ' ']);
    }
    (!entries.is_empty()).then_some(entries)
}

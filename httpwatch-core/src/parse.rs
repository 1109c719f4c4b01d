//! w3c-style access log line parsing.
//!
//! One raw text line goes in, a [`LogRecord`] or a [`ParseError`] comes out.
//! Tokenizing is escaping-aware: a backslash escapes the next character and
//! is itself dropped from the token.

use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("end delimiter not found")]
    EndDelimiter,

    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    #[error("unsupported protocol '{0}'")]
    Protocol(String),

    #[error("expected '{expected}' at '{rest}'")]
    Expected { expected: char, rest: String },

    #[error("invalid status code '{0}'")]
    Status(String),

    #[error("invalid response size '{0}'")]
    Size(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http09,
    Http10,
    Http11,
    Http20,
}

impl FromStr for Protocol {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP/0.9" => Ok(Protocol::Http09),
            "HTTP/1.0" => Ok(Protocol::Http10),
            "HTTP/1.1" => Ok(Protocol::Http11),
            "HTTP/2.0" => Ok(Protocol::Http20),
            other => Err(ParseError::Protocol(other.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::Http09 => "HTTP/0.9",
            Protocol::Http10 => "HTTP/1.0",
            Protocol::Http11 => "HTTP/1.1",
            Protocol::Http20 => "HTTP/2.0",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub uri: String,
    pub protocol: Protocol,
}

/// One successfully parsed access-log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub addr: String,
    pub user: String,
    pub auth: String,
    pub date: DateTime<FixedOffset>,
    pub request: Request,
    pub status: u16,
    pub size: u64,
}

/// Scans `input` up to the first unescaped `delim` and returns the token
/// (escapes resolved) plus the rest of the input after the delimiter.
///
/// The delimiter is required: running off the end of the string is an error,
/// even if the only delimiter present was escaped.
pub fn parse_string(input: &str, delim: char) -> Result<(String, &str), ParseError> {
    let mut token = String::new();
    let mut chars = input.char_indices();

    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, escaped)) => token.push(escaped),
                // Trailing backslash; no delimiter can follow.
                None => break,
            }
        } else if c == delim {
            return Ok((token, &input[i + c.len_utf8()..]));
        } else {
            token.push(c);
        }
    }

    Err(ParseError::EndDelimiter)
}

/// Parses the fixed `DD/Mon/YYYY:HH:MM:SS +HHMM` access-log timestamp.
pub fn parse_datetime(input: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_str(input, "%d/%b/%Y:%H:%M:%S %z")
        .map_err(|_| ParseError::Timestamp(input.to_string()))
}

/// Splits a request string into method, URI and protocol. The method is
/// upper-cased and otherwise accepted as-is; the protocol must be a known
/// HTTP version.
pub fn parse_request(input: &str) -> Result<Request, ParseError> {
    let (method, rest) = parse_string(input, ' ')?;
    let (uri, protocol) = parse_string(rest, ' ')?;

    Ok(Request {
        method: method.to_uppercase(),
        uri,
        protocol: protocol.parse()?,
    })
}

fn expect(input: &str, prefix: char) -> Result<&str, ParseError> {
    input.strip_prefix(prefix).ok_or_else(|| ParseError::Expected {
        expected: prefix,
        rest: input.to_string(),
    })
}

/// Parses one full log line:
///
/// ```text
/// 127.0.0.1 - james [09/May/2018:16:00:39 +0000] "GET /report HTTP/1.0" 200 123
/// ```
///
/// Leading and trailing whitespace is trimmed first. Any malformed field
/// fails the whole line; no partial record is ever produced.
pub fn parse_log_line(line: &str) -> Result<LogRecord, ParseError> {
    let line = line.trim();

    let (addr, rest) = parse_string(line, ' ')?;
    let (user, rest) = parse_string(rest, ' ')?;
    let (auth, rest) = parse_string(rest, ' ')?;

    let rest = expect(rest, '[')?;
    let (date_raw, rest) = parse_string(rest, ']')?;
    let date = parse_datetime(&date_raw)?;

    let rest = expect(rest, ' ')?;
    let rest = expect(rest, '"')?;
    let (request_raw, rest) = parse_string(rest, '"')?;
    let request = parse_request(&request_raw)?;

    let rest = expect(rest, ' ')?;
    let (status_raw, rest) = parse_string(rest, ' ')?;
    let status: u16 = status_raw
        .parse()
        .map_err(|_| ParseError::Status(status_raw.clone()))?;
    if !(100..=599).contains(&status) {
        return Err(ParseError::Status(status_raw));
    }

    // The size is the remainder of the line; anything after it (including a
    // stray extra field) fails the integer parse.
    let size: u64 = rest.parse().map_err(|_| ParseError::Size(rest.to_string()))?;

    Ok(LogRecord {
        addr,
        user,
        auth,
        date,
        request,
        status,
        size,
    })
}

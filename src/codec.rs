//! Request-line codec.
//!
//! Wire format (one request per connection, always closed after the reply):
//! ```text
//! GET /drive?x=10&y=-40&t=100 HTTP/1.1\r\n   ← request line (parsed)
//! Host: 10.0.0.2\r\n                         ← headers (drained, ignored)
//! \r\n                                       ← blank line
//! ```
//!
//! Reads are byte-at-a-time with a bounded *inactivity* wait per line and
//! one overall [`Deadline`] per request, so a client trickling bytes costs
//! at most the request budget. Nothing here allocates on the read path;
//! lines land in fixed-capacity buffers.

use core::fmt::Write as _;
use std::borrow::Cow;

use log::debug;

use crate::error::ProtocolError;
use crate::net::Connection;
use crate::ports::Clock;

/// Longest accepted request or header line, in bytes.
pub const MAX_LINE_LEN: usize = 512;

/// Maximum header lines drained before giving up.
pub const MAX_HEADER_LINES: usize = 64;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";

/// A decoded, trimmed request line.
pub type Line = heapless::String<MAX_LINE_LEN>;

type LineBuf = heapless::Vec<u8, MAX_LINE_LEN>;

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Overall time limit for reading one request.
///
/// Fixed once when the connection is accepted and shared by the request
/// line and the header drain. Unlike the per-line inactivity wait it
/// never restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start_ms: u32,
    budget_ms: u32,
}

impl Deadline {
    pub const fn new(start_ms: u32, budget_ms: u32) -> Self {
        Self {
            start_ms,
            budget_ms,
        }
    }

    pub fn passed(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.start_ms) >= self.budget_ms
    }
}

/// How a raw line read ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    Newline,
    Disconnected,
    TimedOut,
    OverBudget,
}

/// Collect bytes up to `\n` into `buf`.
///
/// The inactivity wait restarts on every byte; it expires after
/// `max_wait_ms` with nothing received. `deadline` is checked on every
/// byte and every idle poll.
fn read_raw_line<C: Connection, K: Clock>(
    conn: &mut C,
    clock: &mut K,
    max_wait_ms: u32,
    deadline: Deadline,
    buf: &mut LineBuf,
) -> Result<LineEnd, ProtocolError> {
    let mut last_byte_at = clock.now_ms();
    let mut byte = [0u8; 1];

    loop {
        match conn.read(&mut byte) {
            Ok(n) if n > 0 => {
                last_byte_at = clock.now_ms();
                if byte[0] == b'\n' {
                    return Ok(LineEnd::Newline);
                }
                buf.push(byte[0]).map_err(|_| ProtocolError::LineTooLong)?;
                if deadline.passed(last_byte_at) {
                    return Ok(LineEnd::OverBudget);
                }
            }
            Ok(_) => {
                if !conn.is_connected() {
                    return Ok(LineEnd::Disconnected);
                }
                let now = clock.now_ms();
                if deadline.passed(now) {
                    return Ok(LineEnd::OverBudget);
                }
                if now.wrapping_sub(last_byte_at) >= max_wait_ms {
                    return Ok(LineEnd::TimedOut);
                }
                clock.delay_ms(1);
            }
            Err(e) => {
                debug!("connection read failed: {e:?}");
                return Err(ProtocolError::ReadFailed);
            }
        }
    }
}

/// Read the first line of a request.
///
/// A partial line cut short by a disconnect or inactivity still counts as
/// the line. Returns [`ProtocolError::Timeout`] (or `Disconnected`) when
/// not a single byte arrived, and `Timeout` whenever `deadline` passes
/// before the line is complete.
pub fn read_request_line<C: Connection, K: Clock>(
    conn: &mut C,
    clock: &mut K,
    max_wait_ms: u32,
    deadline: Deadline,
) -> Result<Line, ProtocolError> {
    let mut raw = LineBuf::new();
    let end = read_raw_line(conn, clock, max_wait_ms, deadline, &mut raw)?;

    if end == LineEnd::OverBudget {
        return Err(ProtocolError::Timeout);
    }
    if raw.is_empty() {
        match end {
            LineEnd::Disconnected => return Err(ProtocolError::Disconnected),
            LineEnd::Newline => return Err(ProtocolError::Empty),
            LineEnd::TimedOut | LineEnd::OverBudget => return Err(ProtocolError::Timeout),
        }
    }

    let text = core::str::from_utf8(&raw).map_err(|_| ProtocolError::NotUtf8)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let mut line = Line::new();
    line.push_str(trimmed)
        .map_err(|()| ProtocolError::LineTooLong)?;
    Ok(line)
}

/// Discard header lines up to the blank separator.
///
/// Stops on the blank line, a disconnect, an inactivity timeout, the
/// request `deadline`, any read error, or after [`MAX_HEADER_LINES`].
/// Returns the number of header lines discarded.
pub fn drain_headers<C: Connection, K: Clock>(
    conn: &mut C,
    clock: &mut K,
    max_wait_ms: u32,
    deadline: Deadline,
) -> usize {
    let mut drained = 0;
    while drained < MAX_HEADER_LINES {
        let mut raw = LineBuf::new();
        match read_raw_line(conn, clock, max_wait_ms, deadline, &mut raw) {
            Ok(LineEnd::Newline) => {
                if raw.iter().all(u8::is_ascii_whitespace) {
                    return drained;
                }
                drained += 1;
            }
            Ok(LineEnd::Disconnected | LineEnd::TimedOut | LineEnd::OverBudget) => {
                if !raw.is_empty() {
                    drained += 1;
                }
                return drained;
            }
            Err(_) => return drained,
        }
    }
    debug!("header drain hit the {MAX_HEADER_LINES}-line cap");
    drained
}

// ---------------------------------------------------------------------------
// Request-line parsing
// ---------------------------------------------------------------------------

/// A request line split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
}

/// Split `METHOD TARGET [VERSION]` and the target into path and query.
pub fn parse_request_line(line: &str) -> RequestLine<'_> {
    let mut parts = line.split_ascii_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    RequestLine {
        method,
        path,
        query,
    }
}

/// The text between the first `?` and the next space (or end of line).
fn query_section(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once('?')?;
    Some(rest.split(' ').next().unwrap_or(rest))
}

/// Raw value of `key` in the query, first occurrence wins.
fn query_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    query_section(line)?
        .split('&')
        .find_map(|pair| pair.split_once('=').filter(|(k, _)| *k == key).map(|(_, v)| v))
}

/// Integer value of `key` from the query.
///
/// `+` decodes to a space before the numeric parse. A present key with no
/// leading digits parses as 0.
pub fn extract_query_int(line: &str, key: &str) -> Option<i32> {
    let raw = query_value(line, key)?;
    Some(parse_int(
        raw.bytes().map(|b| if b == b'+' { b' ' } else { b }),
    ))
}

/// Literal remainder of the query starting at the value of `key`.
///
/// Nothing is decoded, and `&` separators after the value are kept.
pub fn query_raw_from<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let query = query_section(line)?;
    let mut offset = 0;
    for pair in query.split('&') {
        if let Some((k, _)) = pair.split_once('=') {
            if k == key {
                return Some(&query[offset + k.len() + 1..]);
            }
        }
        offset += pair.len() + 1;
    }
    None
}

/// `atol`-style parse: leading whitespace, optional sign, leading digits.
/// Saturates to the `i32` range.
fn parse_int(bytes: impl Iterator<Item = u8>) -> i32 {
    let mut bytes = bytes.skip_while(u8::is_ascii_whitespace).peekable();
    let negative = match bytes.peek() {
        Some(b'-') => {
            bytes.next();
            true
        }
        Some(b'+') => {
            bytes.next();
            false
        }
        _ => false,
    };

    let mut acc: i64 = 0;
    for b in bytes.take_while(u8::is_ascii_digit) {
        acc = acc.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        acc = -acc;
    }
    acc.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    NotFound,
}

impl StatusCode {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotFound => "Not Found",
        }
    }
}

/// A complete reply, ready for [`send_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Cow<'static, str>,
}

impl Response {
    /// `200` with a plain-text body.
    pub fn text(body: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type: TEXT_PLAIN,
            body: body.into(),
        }
    }

    /// `200` with an HTML body.
    pub fn html(body: String) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type: TEXT_HTML,
            body: Cow::Owned(body),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NotFound,
            content_type: TEXT_PLAIN,
            body: Cow::Borrowed("Not Found"),
        }
    }
}

/// Errors raised while writing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError<E> {
    /// The connection reported an error.
    Io(E),
    /// A write accepted zero bytes.
    Stalled,
    /// The header block did not fit its buffer.
    HeaderOverflow,
}

fn write_all<C: Connection>(conn: &mut C, mut data: &[u8]) -> Result<(), SendError<C::Error>> {
    while !data.is_empty() {
        let n = conn.write(data).map_err(SendError::Io)?;
        if n == 0 {
            return Err(SendError::Stalled);
        }
        data = &data[n..];
    }
    Ok(())
}

/// Write status line, headers and body.
///
/// `Content-Length` is the body's exact byte length and the response
/// always announces `Connection: close`.
pub fn send_response<C: Connection>(
    conn: &mut C,
    response: &Response,
) -> Result<(), SendError<C::Error>> {
    let mut head: heapless::String<256> = heapless::String::new();
    write!(
        head,
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nConnection: close\r\nContent-Length: {}\r\n\r\n",
        response.status.code(),
        response.status.reason(),
        response.content_type,
        response.body.len(),
    )
    .map_err(|_| SendError::HeaderOverflow)?;

    write_all(conn, head.as_bytes())?;
    write_all(conn, response.body.as_bytes())?;
    conn.flush().map_err(SendError::Io)
}

/// `200 OK` with the given content type and body.
pub fn send_ok<C: Connection>(
    conn: &mut C,
    content_type: &'static str,
    body: &str,
) -> Result<(), SendError<C::Error>> {
    send_response(
        conn,
        &Response {
            status: StatusCode::Ok,
            content_type,
            body: Cow::Owned(body.to_owned()),
        },
    )
}

/// `404 Not Found`.
pub fn send_not_found<C: Connection>(conn: &mut C) -> Result<(), SendError<C::Error>> {
    send_response(conn, &Response::not_found())
}

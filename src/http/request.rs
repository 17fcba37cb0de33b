//! Incoming request model and request-head parsing.
//!
//! # Responsibilities
//! - Hold the parsed request line and headers for one dispatch
//! - Carry path parameters bound by the route matcher
//! - Parse a request head from a buffered reader
//!
//! # Design Decisions
//! - Only the head is read; no body framing (no keep-alive, no chunking)
//! - Line and header-count limits are enforced while reading
//! - No percent-decoding: the path is matched exactly as received

use std::collections::HashMap;
use std::io::{self, BufRead, Read};

use thiserror::Error;

use crate::http::headers::Headers;
use crate::http::method::{Method, UnknownMethod, UnsupportedVersion, Version};

/// Longest accepted request or header line, in bytes.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Most header lines accepted in one request.
pub const MAX_HEADERS: usize = 100;

/// Errors raised while reading a request head.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error while reading request: {0}")]
    Io(#[from] io::Error),

    #[error("connection closed before a request line was received")]
    Empty,

    #[error("malformed request line: {0:?}")]
    RequestLine(String),

    #[error(transparent)]
    Method(#[from] UnknownMethod),

    #[error(transparent)]
    Version(#[from] UnsupportedVersion),

    #[error("malformed header line: {0:?}")]
    Header(String),

    #[error("more than 100 headers")]
    TooManyHeaders,

    #[error("line longer than 8192 bytes")]
    LineTooLong,

    #[error("request head is not valid UTF-8")]
    Encoding,
}

/// A parsed request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    version: Version,
    headers: Headers,
    params: HashMap<String, String>,
}

impl Request {
    /// Create a request with no headers.
    pub fn new(method: Method, path: impl Into<String>, version: Version) -> Self {
        let (path, query) = split_target(&path.into());
        Self {
            method,
            path,
            query,
            version,
            headers: Headers::new(),
            params: HashMap::new(),
        }
    }

    /// Builder-style header setter.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Read a request line and headers, up to and including the blank line.
    pub fn parse<R: BufRead>(reader: &mut R) -> Result<Self, ParseError> {
        let request_line = match read_line(reader)? {
            Some(line) => line,
            None => return Err(ParseError::Empty),
        };

        let mut parts = request_line.split_whitespace();
        let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(t), Some(v), None) => (m, t, v),
            _ => return Err(ParseError::RequestLine(request_line.clone())),
        };

        let mut request = Request::new(method.parse()?, target, version.parse()?);

        let mut count = 0;
        loop {
            let line = read_line(reader)?.ok_or_else(|| {
                ParseError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed inside request head",
                ))
            })?;
            if line.is_empty() {
                break;
            }

            count += 1;
            if count > MAX_HEADERS {
                return Err(ParseError::TooManyHeaders);
            }

            let (name, value) = line
                .split_once(':')
                .filter(|(name, _)| !name.is_empty() && !name.contains(char::is_whitespace))
                .ok_or_else(|| ParseError::Header(line.clone()))?;
            request.headers.set(name, value.trim());
        }

        Ok(request)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Request path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string (the part after `?`), if any.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Path parameters bound by the matched route.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}

fn split_target(target: &str) -> (String, Option<String>) {
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    }
}

/// Read one CRLF- or LF-terminated line. `None` at clean end of input.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, ParseError> {
    let mut raw = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_BYTES as u64 + 2)
        .read_until(b'\n', &mut raw)?;
    if read == 0 {
        return Ok(None);
    }
    if raw.last() != Some(&b'\n') {
        if raw.len() > MAX_LINE_BYTES {
            return Err(ParseError::LineTooLong);
        }
        return Err(ParseError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "unterminated line",
        )));
    }
    raw.pop();
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    if raw.len() > MAX_LINE_BYTES {
        return Err(ParseError::LineTooLong);
    }
    String::from_utf8(raw).map(Some).map_err(|_| ParseError::Encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Request, ParseError> {
        Request::parse(&mut raw.as_bytes())
    }

    #[test]
    fn parses_request_line_and_headers() {
        let req = parse("GET /player/54?full=1 HTTP/1.1\r\nHost: example.com\r\nX-Trace:  abc \r\n\r\n").unwrap();
        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.path(), "/player/54");
        assert_eq!(req.query(), Some("full=1"));
        assert_eq!(req.version(), Version::Http11);
        assert_eq!(req.header("host"), Some("example.com"));
        assert_eq!(req.header("x-trace"), Some("abc"));
        assert!(req.params().is_empty());
    }

    #[test]
    fn accepts_bare_line_feeds() {
        let req = parse("POST /item HTTP/1.0\nContent-Length: 0\n\n").unwrap();
        assert_eq!(req.method(), Method::Post);
        assert_eq!(req.version(), Version::Http10);
        assert_eq!(req.header("Content-Length"), Some("0"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(parse(""), Err(ParseError::Empty)));
    }

    #[test]
    fn rejects_bad_request_line() {
        assert!(matches!(parse("GET /\r\n\r\n"), Err(ParseError::RequestLine(_))));
        assert!(matches!(parse("GET / HTTP/1.1 extra\r\n\r\n"), Err(ParseError::RequestLine(_))));
        assert!(matches!(parse("BREW / HTTP/1.1\r\n\r\n"), Err(ParseError::Method(_))));
        assert!(matches!(parse("GET / HTTP/2\r\n\r\n"), Err(ParseError::Version(_))));
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(parse("GET / HTTP/1.1\r\nno-colon\r\n\r\n"), Err(ParseError::Header(_))));
        assert!(matches!(parse("GET / HTTP/1.1\r\nBad Name: x\r\n\r\n"), Err(ParseError::Header(_))));
    }

    #[test]
    fn rejects_truncated_head() {
        assert!(matches!(parse("GET / HTTP/1.1\r\nHost: a\r\n"), Err(ParseError::Io(_))));
    }

    #[test]
    fn enforces_limits() {
        let mut raw = String::from("GET / HTTP/1.1\r\n");
        for i in 0..=MAX_HEADERS {
            raw.push_str(&format!("x-h{}: v\r\n", i));
        }
        raw.push_str("\r\n");
        assert!(matches!(parse(&raw), Err(ParseError::TooManyHeaders)));

        let long = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(MAX_LINE_BYTES + 10));
        assert!(matches!(parse(&long), Err(ParseError::LineTooLong)));
    }

    #[test]
    fn rejects_non_utf8_head() {
        let raw: &[u8] = b"GET /caf\xe9 HTTP/1.1\r\n\r\n";
        assert!(matches!(Request::parse(&mut &raw[..]), Err(ParseError::Encoding)));

        let raw: &[u8] = b"GET / HTTP/1.1\r\nX-Name: \xff\r\n\r\n";
        assert!(matches!(Request::parse(&mut &raw[..]), Err(ParseError::Encoding)));
    }
}

//! Response building and wire serialization.
//!
//! # Responsibilities
//! - Hold status, version, user-set headers and body bytes for one dispatch
//! - Derive the wire header set (`Server`, `Content-Length`, charset) at
//!   serialization time
//! - Frame the response onto a connection, text or binary
//!
//! # Design Decisions
//! - Defaults are computed into a derived view; the stored header map is
//!   never touched by `serialize`, so repeated calls are byte-identical
//! - Explicitly set headers always win over defaults
//! - Binary bodies are written raw, after the header block, never through
//!   the text path

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::http::headers::{capitalize_name, Headers};
use crate::http::method::Version;
use crate::http::request::Request;
use crate::http::status::StatusCode;

/// Value of the `Server` header when none is set.
pub const DEFAULT_SERVER: &str = "Omny";

/// Attribute appended to `Content-Type` for text responses.
pub const TEXT_CHARSET: &str = "charset=UTF-8";

/// Terminator written after a binary body.
pub const BINARY_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Headers emitted first, in this order, when present.
const LEADING_HEADERS: [&str; 3] = ["server", "content-length", "content-type"];

/// Mutable response for a single dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: Headers,
    body: Vec<u8>,
    binary: bool,
}

impl Response {
    /// A `200 OK` response for the given protocol version.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// A `200 OK` response answering `request`.
    pub fn for_request(request: &Request) -> Self {
        Self::new(request.version())
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// User-set headers. Defaults are not included.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    /// Append to a header with `;` as separator.
    pub fn append_header(&mut self, name: &str, value: &str) {
        self.headers.append(name, value);
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn append_body(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    pub fn append_text(&mut self, text: &str) {
        self.body.extend_from_slice(text.as_bytes());
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn set_binary(&mut self, binary: bool) {
        self.binary = binary;
    }

    /// Header set as it goes on the wire, with defaults applied.
    ///
    /// `server`, `content-length` and `content-type` come first, the rest
    /// follow in name order.
    pub fn wire_headers(&self) -> Vec<(String, String)> {
        let mut effective = self.headers.clone();
        if !effective.contains("server") {
            effective.set("server", DEFAULT_SERVER);
        }
        if !effective.contains("content-length") {
            effective.set("content-length", self.body.len().to_string());
        }
        if !self.binary {
            effective.append("content-type", TEXT_CHARSET);
        }

        let mut wire = Vec::with_capacity(effective.len());
        for name in LEADING_HEADERS {
            if let Some(value) = effective.get(name) {
                wire.push((capitalize_name(name), value.to_string()));
            }
        }
        for (name, value) in effective.iter() {
            if !LEADING_HEADERS.contains(&name) {
                wire.push((capitalize_name(name), value.to_string()));
            }
        }
        wire
    }

    /// Serialize status line, headers and, for text responses, the body.
    ///
    /// For binary responses only the header block is produced; the raw
    /// body is written separately by [`Response::write_to`].
    pub fn serialize(&self) -> Vec<u8> {
        let mut text = String::new();
        let _ = write!(
            text,
            "{} {} {}\r\n",
            self.version.tag(),
            self.status.code(),
            self.status.reason()
        );
        for (name, value) in self.wire_headers() {
            let _ = write!(text, "{}: {}\r\n", name, value);
        }
        text.push_str("\r\n");

        let mut wire = text.into_bytes();
        if !self.body.is_empty() && !self.binary {
            // Raw bytes: Content-Length counts them as stored.
            wire.extend_from_slice(&self.body);
            wire.extend_from_slice(b"\r\n");
        }
        wire
    }

    /// Write the framed response to `sink` and flush it.
    ///
    /// Text: one write of the serialized response.
    /// Binary: header block, raw body, then `\r\n\r\n`, as three writes.
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(&self.serialize())?;
        if self.binary {
            sink.write_all(&self.body)?;
            sink.write_all(BINARY_TERMINATOR)?;
        }
        sink.flush()
    }
}

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::Listener)
//!     → server.rs (blocking worker per connection)
//!     → request.rs (parse request line and headers)
//!     → routing::Router::dispatch
//!     → response.rs (derived headers, framing, write, flush)
//!     → connection closed
//! ```
//!
//! # Design Decisions
//! - Value types (method, version, status, headers) are plain enums and maps
//! - Header names are stored lowercase and title-cased on the wire
//! - The stored header map is never mutated by serialization

pub mod headers;
pub mod method;
pub mod request;
pub mod response;
pub mod server;
pub mod status;

pub use headers::Headers;
pub use method::{Method, UnknownMethod, UnsupportedVersion, Version};
pub use request::{ParseError, Request};
pub use response::Response;
pub use server::{serve, BaseRoutes, HttpServer, Served};
pub use status::StatusCode;

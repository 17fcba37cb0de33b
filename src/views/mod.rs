//! Views: the render step between a route handler and the wire.
//!
//! # Data Flow
//! ```text
//! Route handler (request, response)
//!     → returns Box<dyn View>
//!     → view.render(response)   (append body, set content type / binary)
//!     → Response::write_to(connection)
//! ```
//!
//! # Design Decisions
//! - Views only mutate the response; they never touch the connection
//! - Text views leave `Content-Type` to the charset default
//! - File views switch the response to binary framing

pub mod file;
pub mod json;
pub mod text;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::http::Response;
use crate::routing::error::BoxError;

pub use file::{content_type_for, FileView};
pub use json::JsonView;
pub use text::TextView;

/// Render step applied to a response after the route handler returns.
pub trait View {
    fn render(&self, response: &mut Response) -> Result<(), BoxError>;
}

/// Leaves the response as the handler left it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyView;

impl View for EmptyView {
    fn render(&self, _response: &mut Response) -> Result<(), BoxError> {
        Ok(())
    }
}

pub fn empty() -> Box<dyn View> {
    Box::new(EmptyView)
}

pub fn text(body: impl Into<String>) -> Box<dyn View> {
    Box::new(TextView::new(body))
}

pub fn html(body: impl Into<String>) -> Box<dyn View> {
    Box::new(TextView::html(body))
}

/// Serialize `value` as a JSON view.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Box<dyn View>, BoxError> {
    Ok(Box::new(JsonView::new(value)?))
}

/// A file read from disk when the view renders.
pub fn file(path: impl Into<PathBuf>) -> Box<dyn View> {
    Box::new(FileView::from_path(path))
}

/// Preloaded bytes served as a binary body.
pub fn bytes(data: Arc<[u8]>, content_type: &str) -> Box<dyn View> {
    Box::new(FileView::from_bytes(data, content_type))
}

//! Route handlers bound into the route table.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::http::{Request, Response};
use crate::routing::error::BoxError;
use crate::views::{self, View};

/// Result of a route handler: the view that renders the response.
pub type RouteResult = Result<Box<dyn View>, BoxError>;

/// A handler bound to a (pattern, method) pair.
///
/// The handler may set status and headers on `response` and returns the
/// view that renders the body.
pub trait Route: Send + Sync {
    fn handle(&self, request: &Request, response: &mut Response) -> RouteResult;
}

/// Adapter turning a closure into a [`Route`].
pub struct FnRoute<F>(pub F);

impl<F> Route for FnRoute<F>
where
    F: Fn(&Request, &mut Response) -> RouteResult + Send + Sync,
{
    fn handle(&self, request: &Request, response: &mut Response) -> RouteResult {
        (self.0)(request, response)
    }
}

impl<F> fmt::Debug for FnRoute<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnRoute")
    }
}

/// Serves a file read from disk on every request.
#[derive(Debug, Clone)]
pub struct FileRoute {
    path: PathBuf,
}

impl FileRoute {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Route for FileRoute {
    fn handle(&self, _request: &Request, _response: &mut Response) -> RouteResult {
        Ok(views::file(self.path.clone()))
    }
}

/// Serves file contents loaded once, at registration.
#[derive(Debug, Clone)]
pub struct LoadedFileRoute {
    data: Arc<[u8]>,
    content_type: &'static str,
}

impl LoadedFileRoute {
    pub fn new(data: Arc<[u8]>, content_type: &'static str) -> Self {
        Self { data, content_type }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Route for LoadedFileRoute {
    fn handle(&self, _request: &Request, _response: &mut Response) -> RouteResult {
        Ok(views::bytes(Arc::clone(&self.data), self.content_type))
    }
}

/// Serves a fixed text body with an optional content type.
#[derive(Debug, Clone)]
pub struct TextRoute {
    body: String,
    content_type: Option<String>,
}

impl TextRoute {
    pub fn new(body: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            body: body.into(),
            content_type,
        }
    }
}

impl Route for TextRoute {
    fn handle(&self, _request: &Request, response: &mut Response) -> RouteResult {
        if let Some(content_type) = &self.content_type {
            response.set_header("content-type", content_type.as_str());
        }
        Ok(views::text(self.body.clone()))
    }
}

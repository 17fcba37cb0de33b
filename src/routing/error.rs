//! Routing and dispatch errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::http::Method;

/// Boxed error returned by route handlers and views.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration errors, raised eagerly at registration time.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The (pattern, method) pair is already registered.
    #[error("a route for {method} {pattern} is already registered")]
    DuplicateRoute { pattern: String, method: Method },

    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A static mount pointed at a file.
    #[error("static root {0:?} is a file, a directory is required")]
    NotADirectory(PathBuf),

    #[error("I/O error while registering {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RouteError {
    pub(crate) fn invalid(pattern: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RouteError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that end a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Writing to the connection failed.
    #[error("connection write failed: {0}")]
    Io(#[from] io::Error),

    /// A route handler, view or pre-dispatch handler failed.
    #[error("handler failed: {0}")]
    Handler(BoxError),
}

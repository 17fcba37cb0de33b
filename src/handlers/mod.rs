//! Pre-dispatch request handlers.
//!
//! # Data Flow
//! ```text
//! Request
//!     → HandlerChain::run_all
//!         HIGH tier    (application interceptors)
//!         DEFAULT tier (static_files.rs, installed by Router::new)
//!         LOW tier
//!     → first handler returning true has written the whole response: stop
//!     → otherwise fall through to route-table dispatch
//! ```
//!
//! # Design Decisions
//! - Tiers are a closed, ordered set held in a fixed array per router
//! - Within a tier handlers run in registration order
//! - A handler that returns true owns the response; nothing else runs

pub mod static_files;

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http::Request;
use crate::routing::error::DispatchError;
use crate::routing::Router;

pub use static_files::{StaticFileHandler, StaticMount, StaticPolicy};

/// Ordering bucket for pre-dispatch handlers. Visited `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Default,
    Low,
}

impl Priority {
    /// All tiers in visiting order.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Default, Priority::Low];

    fn index(self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Default => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::High => "high",
            Priority::Default => "default",
            Priority::Low => "low",
        })
    }
}

/// A handler consulted before route dispatch.
///
/// Returning `Ok(true)` means the handler wrote a complete response to
/// `conn`; no further handler and no route runs for this request.
pub trait RequestHandler: Send + Sync {
    fn handle(
        &self,
        router: &Router,
        request: &Request,
        conn: &mut dyn Write,
    ) -> Result<bool, DispatchError>;
}

impl<F> RequestHandler for F
where
    F: Fn(&Router, &Request, &mut dyn Write) -> Result<bool, DispatchError> + Send + Sync,
{
    fn handle(
        &self,
        router: &Router,
        request: &Request,
        conn: &mut dyn Write,
    ) -> Result<bool, DispatchError> {
        self(router, request, conn)
    }
}

/// Pre-dispatch handlers grouped by priority tier.
#[derive(Clone, Default)]
pub struct HandlerChain {
    tiers: [Vec<Arc<dyn RequestHandler>>; 3],
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the `priority` tier.
    pub fn add(&mut self, handler: Arc<dyn RequestHandler>, priority: Priority) {
        self.tiers[priority.index()].push(handler);
    }

    /// Run tiers from highest to lowest priority.
    ///
    /// Returns the tier of the handler that fully handled the request, or
    /// `None` if every handler declined.
    pub fn run_all(
        &self,
        router: &Router,
        request: &Request,
        conn: &mut dyn Write,
    ) -> Result<Option<Priority>, DispatchError> {
        for priority in Priority::ALL {
            for handler in &self.tiers[priority.index()] {
                if handler.handle(router, request, conn)? {
                    return Ok(Some(priority));
                }
            }
        }
        Ok(None)
    }

    /// Append every handler of `other`, tier by tier.
    pub fn extend(&mut self, other: &HandlerChain) {
        for priority in Priority::ALL {
            let i = priority.index();
            self.tiers[i].extend(other.tiers[i].iter().cloned());
        }
    }

    /// Drop the static file handler `Router::new` puts at the front of the
    /// DEFAULT tier.
    pub(crate) fn remove_builtin(&mut self) {
        let tier = &mut self.tiers[Priority::Default.index()];
        if !tier.is_empty() {
            tier.remove(0);
        }
    }

    /// Number of handlers in `priority`.
    pub fn tier_len(&self, priority: Priority) -> usize {
        self.tiers[priority.index()].len()
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("high", &self.tier_len(Priority::High))
            .field("default", &self.tier_len(Priority::Default))
            .field("low", &self.tier_len(Priority::Low))
            .finish()
    }
}

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed Request (method, path, version, headers)
//!     → router.rs (dispatch)
//!         → handlers::HandlerChain (pre-dispatch, may answer and stop)
//!         → table.rs (scan patterns in registration order)
//!             → matcher.rs (segment compare, bind :params)
//!         → route.rs (matched handler → View)
//!         → http::Response (render, serialize, write, flush)
//!     → or 404 Not Found when nothing matched
//!
//! Route Registration (at startup):
//!     Router::route / get / post / route_file / static_dir
//!     or Router::from_config
//!     → duplicate (pattern, method) rejected immediately
//!     → Router frozen behind Arc and shared by all connections
//! ```
//!
//! # Design Decisions
//! - Router is immutable while serving; reloads build a new one
//! - No regex; single-segment named parameters only
//! - Deterministic: registration order decides between candidates
//! - Handler and view failures propagate, no internal 500 synthesis

pub mod error;
pub mod matcher;
pub mod route;
pub mod router;
pub mod table;

pub use error::{BoxError, DispatchError, RouteError};
pub use matcher::{match_path, Params, PathPattern};
pub use route::{FileRoute, FnRoute, LoadedFileRoute, Route, RouteResult, TextRoute};
pub use router::{Dispatched, Router};
pub use table::{RouteMatch, RouteTable};

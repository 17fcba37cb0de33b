//! Omny: a minimal HTTP/1.1 router.
//!
//! Routes map `(path pattern, method)` to handlers. Patterns are literal
//! segments or `:name` parameters. Pre-dispatch handlers run in priority
//! tiers before the route table, and unmatched requests get a 404.

pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod views;

pub use config::OmnyConfig;
pub use handlers::{HandlerChain, Priority, RequestHandler, StaticPolicy};
pub use http::{HttpServer, Method, Request, Response, StatusCode, Version};
pub use lifecycle::Shutdown;
pub use routing::{match_path, BoxError, DispatchError, Dispatched, Route, RouteError, RouteResult, Router};
pub use views::View;

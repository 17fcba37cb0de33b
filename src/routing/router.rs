//! Router construction and request dispatch.
//!
//! # Responsibilities
//! - Own the route table, the handler chain and static mounts
//! - Register routes eagerly, failing on configuration errors
//! - Dispatch one request: handler chain, route lookup, render, write
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - The static file handler is installed in the DEFAULT tier by `new`
//! - Not-found is a normal 404 response, never an error
//! - Every write is flushed before `dispatch` returns

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{OmnyConfig, RouteConfig};
use crate::handlers::static_files::collect_files;
use crate::handlers::{HandlerChain, Priority, RequestHandler, StaticFileHandler, StaticMount, StaticPolicy};
use crate::http::{Method, Request, Response, StatusCode};
use crate::observability::metrics;
use crate::routing::error::{DispatchError, RouteError};
use crate::routing::route::{FileRoute, FnRoute, LoadedFileRoute, Route, RouteResult, TextRoute};
use crate::routing::table::RouteTable;
use crate::views::content_type_for;

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// A pre-dispatch handler in this tier wrote the response.
    Intercepted(Priority),
    /// A route matched and its response was written.
    Routed { pattern: String, status: StatusCode },
    /// Nothing matched; a 404 was written.
    NotFound,
}

impl Dispatched {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Dispatched::Intercepted(_) => "intercepted",
            Dispatched::Routed { .. } => "routed",
            Dispatched::NotFound => "not_found",
        }
    }
}

impl fmt::Display for Dispatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatched::Intercepted(priority) => write!(f, "intercepted by {} handler", priority),
            Dispatched::Routed { pattern, status } => write!(f, "{} via {}", status, pattern),
            Dispatched::NotFound => f.write_str("404 Not Found"),
        }
    }
}

/// Route table, pre-dispatch handlers and static mounts.
pub struct Router {
    table: RouteTable,
    chain: HandlerChain,
    mounts: Vec<StaticMount>,
}

impl Router {
    /// Create a router with the static file handler in the DEFAULT tier.
    pub fn new() -> Self {
        let mut chain = HandlerChain::new();
        chain.add(Arc::new(StaticFileHandler), Priority::Default);
        Self {
            table: RouteTable::new(),
            chain,
            mounts: Vec::new(),
        }
    }

    /// Build a router from the `routes` and `static_files` sections.
    pub fn from_config(config: &OmnyConfig) -> Result<Self, RouteError> {
        let mut router = Router::new();
        for mount in &config.static_files {
            router.static_dir(&mount.dir, mount.policy)?;
        }
        for route in &config.routes {
            router.route_config(route)?;
        }
        tracing::info!(
            routes = router.table.len(),
            static_mounts = router.mounts.len(),
            "Router built from configuration"
        );
        Ok(router)
    }

    fn route_config(&mut self, config: &RouteConfig) -> Result<&mut Self, RouteError> {
        match (&config.file, &config.text) {
            (Some(file), _) => self.route(&config.path, config.method, FileRoute::new(file)),
            (None, Some(text)) => self.route(
                &config.path,
                config.method,
                TextRoute::new(text.clone(), config.content_type.clone()),
            ),
            (None, None) => Err(RouteError::invalid(&config.path, "route needs a file or a text body")),
        }
    }

    /// Register `route` for `(pattern, method)`.
    pub fn route(
        &mut self,
        pattern: &str,
        method: Method,
        route: impl Route + 'static,
    ) -> Result<&mut Self, RouteError> {
        self.table.register(pattern, method, Arc::new(route))?;
        Ok(self)
    }

    /// Register a closure for `(pattern, method)`.
    pub fn route_fn<F>(&mut self, pattern: &str, method: Method, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) -> RouteResult + Send + Sync + 'static,
    {
        self.route(pattern, method, FnRoute(f))
    }

    pub fn get<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) -> RouteResult + Send + Sync + 'static,
    {
        self.route_fn(pattern, Method::Get, f)
    }

    pub fn post<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) -> RouteResult + Send + Sync + 'static,
    {
        self.route_fn(pattern, Method::Post, f)
    }

    pub fn put<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) -> RouteResult + Send + Sync + 'static,
    {
        self.route_fn(pattern, Method::Put, f)
    }

    pub fn delete<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response) -> RouteResult + Send + Sync + 'static,
    {
        self.route_fn(pattern, Method::Delete, f)
    }

    /// Serve `file` for GET `pattern`, reading it on every request.
    pub fn route_file(&mut self, pattern: &str, file: impl AsRef<Path>) -> Result<&mut Self, RouteError> {
        self.route(pattern, Method::Get, FileRoute::new(file.as_ref()))
    }

    /// Serve the files under `dir`.
    ///
    /// With [`StaticPolicy::OnStartupLoad`] the tree is read now and every
    /// file becomes a literal GET route, so `:` in a file name never binds.
    /// The other policies add a mount consulted by the static file handler
    /// at request time.
    pub fn static_dir(&mut self, dir: impl AsRef<Path>, policy: StaticPolicy) -> Result<&mut Self, RouteError> {
        let dir = dir.as_ref();
        match policy {
            StaticPolicy::OnStartupLoad => {
                // Stage everything first so a failure registers nothing.
                let mut staged = RouteTable::new();
                for (route_path, file) in collect_files(dir)? {
                    let data = std::fs::read(&file).map_err(|e| RouteError::io(&file, e))?;
                    tracing::debug!(route = %route_path, bytes = data.len(), "Routing static file");
                    let route = LoadedFileRoute::new(Arc::from(data), content_type_for(&file));
                    staged.register_literal(&route_path, Method::Get, Arc::new(route))?;
                }
                self.table.merge(&staged)?;
            }
            StaticPolicy::ForEachRequest | StaticPolicy::RequestAndLoad => {
                self.mounts.push(StaticMount::new(dir, policy)?);
            }
        }
        tracing::info!(dir = %dir.display(), policy = ?policy, "Static directory registered");
        Ok(self)
    }

    /// Add a pre-dispatch handler to the DEFAULT tier.
    pub fn handler(&mut self, handler: impl RequestHandler + 'static) -> &mut Self {
        self.handler_with_priority(handler, Priority::Default)
    }

    pub fn handler_with_priority(&mut self, handler: impl RequestHandler + 'static, priority: Priority) -> &mut Self {
        self.chain.add(Arc::new(handler), priority);
        self
    }

    /// Take over the routes, handlers and mounts of `other`.
    ///
    /// Fails without changes if a (pattern, method) pair exists in both.
    /// The built-in static handler of `other` is not duplicated.
    pub fn merge(&mut self, other: Router) -> Result<&mut Self, RouteError> {
        self.table.merge(&other.table)?;
        let mut chain = other.chain;
        chain.remove_builtin();
        self.chain.extend(&chain);
        self.mounts.extend(other.mounts);
        Ok(self)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    pub fn handlers(&self) -> &HandlerChain {
        &self.chain
    }

    pub fn static_mounts(&self) -> &[StaticMount] {
        &self.mounts
    }

    /// Dispatch one request and write its response to `conn`.
    ///
    /// Binds matched path parameters onto `request`. Connection write
    /// failures and handler or view failures are returned as errors.
    pub fn dispatch(&self, request: &mut Request, conn: &mut dyn Write) -> Result<Dispatched, DispatchError> {
        let start = Instant::now();
        let outcome = self.dispatch_inner(request, conn)?;

        let status = match &outcome {
            Dispatched::Routed { status, .. } => Some(status.code()),
            Dispatched::NotFound => Some(StatusCode::NotFound.code()),
            Dispatched::Intercepted(_) => None,
        };
        metrics::record_dispatch(outcome.label(), status, start);
        tracing::debug!(
            method = %request.method(),
            path = %request.path(),
            outcome = %outcome,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Request dispatched"
        );
        Ok(outcome)
    }

    fn dispatch_inner(&self, request: &mut Request, conn: &mut dyn Write) -> Result<Dispatched, DispatchError> {
        if let Some(priority) = self.chain.run_all(self, request, conn)? {
            return Ok(Dispatched::Intercepted(priority));
        }

        let Some(found) = self.table.lookup(request.path(), request.method()) else {
            let response = Response::for_request(request).with_status(StatusCode::NotFound);
            response.write_to(conn)?;
            return Ok(Dispatched::NotFound);
        };

        let pattern = found.pattern.to_string();
        let route = Arc::clone(found.route);
        request.set_params(found.params);

        let mut response = Response::for_request(request);
        let view = route.handle(request, &mut response).map_err(DispatchError::Handler)?;
        view.render(&mut response).map_err(DispatchError::Handler)?;
        response.write_to(conn)?;

        Ok(Dispatched::Routed {
            pattern,
            status: response.status(),
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table)
            .field("handlers", &self.chain)
            .field("static_mounts", &self.mounts)
            .finish()
    }
}

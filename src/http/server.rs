//! HTTP server: accept loop and per-connection driver.
//!
//! # Responsibilities
//! - Accept connections from the bounded listener
//! - Serve each connection on a blocking worker: parse, dispatch once, close
//! - Answer unparseable requests with 400 Bad Request
//! - Swap in a rebuilt Router when the configuration changes
//! - Stop accepting on shutdown and drain in-flight connections
//!
//! # Design Decisions
//! - Dispatch is synchronous over `std::io::Write`, so connections are
//!   converted to blocking std streams and run on `spawn_blocking`
//! - The active Router lives in an `ArcSwap`; each connection takes a
//!   snapshot and keeps it for its whole dispatch
//! - One request per connection, no keep-alive
//! - Dispatch failures are logged and the connection closed; nothing
//!   synthesizes a 500

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{Shutdown as SocketShutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{broadcast, mpsc};

use crate::config::{ListenerConfig, OmnyConfig};
use crate::http::{ParseError, Request, Response, StatusCode, Version};
use crate::net::{ConnectionId, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::{DispatchError, Dispatched, RouteError, Router};

/// How long shutdown waits for in-flight connections.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened on one connection.
#[derive(Debug)]
pub enum Served {
    /// A request was parsed and dispatched.
    Dispatched(Dispatched),
    /// The request head did not parse; a 400 was written.
    BadRequest(ParseError),
    /// The peer sent nothing usable (closed, timed out); nothing was written.
    Closed,
}

/// Builds the routes that survive configuration reloads.
pub type BaseRoutes = Arc<dyn Fn() -> Result<Router, RouteError> + Send + Sync>;

/// HTTP server for the router.
pub struct HttpServer {
    router: Arc<ArcSwap<Router>>,
    base: Option<BaseRoutes>,
    read_timeout: Duration,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a new HTTP server serving `router`.
    pub fn new(router: Router, config: &ListenerConfig) -> Self {
        Self {
            router: Arc::new(ArcSwap::from_pointee(router)),
            base: None,
            read_timeout: Duration::from_secs(config.read_timeout_secs.max(1)),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Rebuild application routes with `base` on every reload.
    ///
    /// Reloads call `base` for a fresh router and merge the configured
    /// routes after it. Without a base, a reload keeps only what the
    /// configuration describes.
    pub fn with_base_routes<F>(mut self, base: F) -> Self
    where
        F: Fn() -> Result<Router, RouteError> + Send + Sync + 'static,
    {
        self.base = Some(Arc::new(base));
        self
    }

    /// Snapshot of the active router.
    pub fn router(&self) -> Arc<Router> {
        self.router.load_full()
    }

    /// Replace the active router. In-flight dispatches keep their snapshot.
    pub fn swap_router(&self, router: Router) {
        self.router.store(Arc::new(router));
    }

    /// Rebuild the router from `config` and swap it in.
    ///
    /// Routes registered in code are dropped unless they come from the
    /// builder given to [`HttpServer::with_base_routes`]. On failure the
    /// current router stays active.
    pub fn reload(&self, config: &OmnyConfig) -> Result<(), RouteError> {
        match self.build(config) {
            Ok(router) => {
                self.swap_router(router);
                metrics::record_config_reload("applied");
                tracing::info!("Configuration reloaded, router swapped");
                Ok(())
            }
            Err(e) => {
                metrics::record_config_reload("rejected");
                tracing::error!(error = %e, "Failed to build router from new configuration, keeping current router");
                Err(e)
            }
        }
    }

    fn build(&self, config: &OmnyConfig) -> Result<Router, RouteError> {
        let configured = Router::from_config(config)?;
        match &self.base {
            Some(base) => {
                let mut router = base()?;
                router.merge(configured)?;
                Ok(router)
            }
            None => Ok(configured),
        }
    }

    /// Connection tracker, for observing in-flight connections.
    pub fn connections(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` rebuild the router
    /// through [`HttpServer::reload`].
    pub async fn run(
        self,
        listener: Listener,
        mut config_updates: mpsc::UnboundedReceiver<OmnyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "HTTP server starting");
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let stream = match into_blocking(stream) {
                            Ok(stream) => stream,
                            Err(e) => {
                                tracing::warn!(peer_addr = %peer, error = %e, "Failed to prepare connection");
                                continue;
                            }
                        };
                        let router = self.router.load_full();
                        let guard = self.tracker.track();
                        let read_timeout = self.read_timeout;
                        tokio::task::spawn_blocking(move || {
                            let _permit = permit;
                            handle_connection(&router, stream, peer, guard.id(), read_timeout);
                        });
                    }
                    Err(ListenerError::Closed) => return Err(ListenerError::Closed),
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                    }
                },
                Some(config) = config_updates.recv() => {
                    let _ = self.reload(&config);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(active_connections = active, "Draining connections");
        }
        if !self.tracker.wait_idle(DRAIN_TIMEOUT).await {
            tracing::warn!(
                active_connections = self.tracker.active_count(),
                "Drain timeout elapsed, abandoning connections"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn into_blocking(stream: tokio::net::TcpStream) -> io::Result<TcpStream> {
    let stream = stream.into_std()?;
    stream.set_nonblocking(false)?;
    Ok(stream)
}

fn handle_connection(router: &Router, stream: TcpStream, peer: SocketAddr, id: ConnectionId, read_timeout: Duration) {
    let result = stream
        .set_read_timeout(Some(read_timeout))
        .and_then(|_| stream.try_clone());
    let read_half = match result {
        Ok(read_half) => read_half,
        Err(e) => {
            tracing::warn!(connection_id = %id, peer_addr = %peer, error = %e, "Failed to set up connection");
            return;
        }
    };

    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(&stream);
    match serve(router, &mut reader, &mut writer) {
        Ok(Served::Dispatched(outcome)) => {
            tracing::trace!(connection_id = %id, peer_addr = %peer, outcome = %outcome, "Connection served");
        }
        Ok(Served::BadRequest(e)) => {
            tracing::debug!(connection_id = %id, peer_addr = %peer, error = %e, "Rejected malformed request");
        }
        Ok(Served::Closed) => {
            tracing::trace!(connection_id = %id, peer_addr = %peer, "Connection closed without a request");
        }
        Err(e) => {
            tracing::warn!(connection_id = %id, peer_addr = %peer, error = %e, "Dispatch failed, closing connection");
        }
    }

    drop(writer);
    let _ = stream.shutdown(SocketShutdown::Both);
}

/// Read one request from `reader`, dispatch it and write the response.
pub fn serve<R: BufRead>(router: &Router, reader: &mut R, writer: &mut dyn Write) -> Result<Served, DispatchError> {
    let mut request = match Request::parse(reader) {
        Ok(request) => request,
        Err(ParseError::Empty) | Err(ParseError::Io(_)) => return Ok(Served::Closed),
        Err(e) => {
            Response::new(Version::Http11)
                .with_status(StatusCode::BadRequest)
                .write_to(writer)?;
            return Ok(Served::BadRequest(e));
        }
    };

    let outcome = router.dispatch(&mut request, writer)?;
    writer.flush()?;
    Ok(Served::Dispatched(outcome))
}

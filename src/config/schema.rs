//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::handlers::StaticPolicy;
use crate::http::Method;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OmnyConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Directories served as static files.
    pub static_files: Vec<StaticFilesConfig>,

    /// Fixed routes backed by a file or an inline body.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Seconds to wait for the request head before giving up.
    pub read_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 1024,
            read_timeout_secs: 5,
        }
    }
}

/// A static file directory and its loading policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticFilesConfig {
    /// Root directory.
    pub dir: PathBuf,

    /// When files are read from disk.
    #[serde(default)]
    pub policy: StaticPolicy,
}

/// A route serving a file or a fixed text body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Path pattern, may contain `:name` segments.
    pub path: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: Method,

    /// File read on every request.
    pub file: Option<PathBuf>,

    /// Inline response body.
    pub text: Option<String>,

    /// Content type for `text` bodies.
    pub content_type: Option<String>,
}

fn default_method() -> Method {
    Method::Get
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: OmnyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.listener.max_connections, 1024);
        assert!(config.routes.is_empty());
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn parses_full_document() {
        let config: OmnyConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"
            read_timeout_secs = 2

            [[static_files]]
            dir = "public"
            policy = "request_and_load"

            [[static_files]]
            dir = "assets"

            [[routes]]
            path = "/about"
            file = "pages/about.html"

            [[routes]]
            path = "/echo"
            method = "POST"
            text = "ok"
            content_type = "text/plain"

            [observability]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.listener.max_connections, 1024);
        assert_eq!(config.static_files[0].policy, StaticPolicy::RequestAndLoad);
        assert_eq!(config.static_files[1].policy, StaticPolicy::OnStartupLoad);
        assert_eq!(config.routes[0].method, Method::Get);
        assert_eq!(config.routes[1].method, Method::Post);
        assert_eq!(config.routes[1].content_type.as_deref(), Some("text/plain"));
        assert_eq!(config.observability.log_level, "debug");
    }
}

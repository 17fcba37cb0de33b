//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (connections > 0, addresses parse)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OmnyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Filesystem checks are left to router construction

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::OmnyConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `routes[2].path`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check `config`, collecting every error.
pub fn validate_config(config: &OmnyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    for (i, mount) in config.static_files.iter().enumerate() {
        if mount.dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(format!("static_files[{}].dir", i), "must not be empty"));
        }
    }

    let mut seen = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        if !route.path.starts_with('/') {
            errors.push(ValidationError::new(
                format!("routes[{}].path", i),
                format!("{:?} must start with '/'", route.path),
            ));
        }
        match (&route.file, &route.text) {
            (Some(_), Some(_)) => errors.push(ValidationError::new(
                format!("routes[{}]", i),
                "set either file or text, not both",
            )),
            (None, None) => errors.push(ValidationError::new(format!("routes[{}]", i), "needs a file or a text body")),
            _ => {}
        }
        if !seen.insert((route.path.as_str(), route.method)) {
            errors.push(ValidationError::new(
                format!("routes[{}]", i),
                format!("duplicate route {} {}", route.method, route.path),
            ));
        }
    }

    if config.observability.metrics_enabled && config.observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, StaticFilesConfig};
    use crate::http::Method;

    fn text_route(path: &str, method: Method) -> RouteConfig {
        RouteConfig {
            path: path.to_string(),
            method,
            file: None,
            text: Some("x".to_string()),
            content_type: None,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&OmnyConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_route_error() {
        let mut config = OmnyConfig::default();
        config.routes.push(text_route("/a", Method::Get));
        config.routes.push(text_route("/a", Method::Get));
        config.routes.push(text_route("/a", Method::Post));
        config.routes.push(text_route("relative", Method::Get));
        let mut both = text_route("/both", Method::Get);
        both.file = Some("x.html".into());
        config.routes.push(both);
        let mut neither = text_route("/neither", Method::Get);
        neither.text = None;
        config.routes.push(neither);

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["routes[1]", "routes[3].path", "routes[4]", "routes[5]"]);
    }

    #[test]
    fn listener_and_static_errors() {
        let mut config = OmnyConfig::default();
        config.listener.bind_address = "localhost".into();
        config.listener.max_connections = 0;
        config.static_files.push(StaticFilesConfig {
            dir: "".into(),
            policy: Default::default(),
        });
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "bad".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0].to_string(), "listener.bind_address: \"localhost\" is not a socket address");
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route prefixes and upstream URLs
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The listener address does not parse as host:port.
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    /// No routes configured; the gateway would 404 everything.
    #[error("no routes configured")]
    NoRoutes,

    /// A route prefix is empty or does not start with '/'.
    #[error("route '{route}' has invalid path prefix '{prefix}'")]
    InvalidPrefix { route: String, prefix: String },

    /// Two routes share the same prefix; resolution would be ambiguous.
    #[error("duplicate route prefix '{0}'")]
    DuplicatePrefix(String),

    /// The upstream base URL does not parse as an absolute http(s) URL.
    #[error("route '{route}' has invalid upstream '{upstream}': {reason}")]
    InvalidUpstream {
        route: String,
        upstream: String,
        reason: String,
    },

    /// A timeout of zero would fail every upstream call.
    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),

    /// A zero body limit would reject every request with a payload.
    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a parsed configuration, collecting every violation.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    let mut seen_prefixes = HashSet::new();
    for route in &config.routes {
        if route.path_prefix.is_empty() || !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        } else if !seen_prefixes.insert(route.path_prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(route.path_prefix.clone()));
        }

        match Url::parse(&route.upstream) {
            Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
                errors.push(ValidationError::InvalidUpstream {
                    route: route.name.clone(),
                    upstream: route.upstream.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
            Ok(url) if url.host_str().is_none() => {
                errors.push(ValidationError::InvalidUpstream {
                    route: route.name.clone(),
                    upstream: route.upstream.clone(),
                    reason: "missing host".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) => {
                errors.push(ValidationError::InvalidUpstream {
                    route: route.name.clone(),
                    upstream: route.upstream.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.upstream_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

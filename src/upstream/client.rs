//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Execute outbound calls against upstream services
//! - Enforce the connect timeout and the per-call ceiling
//! - Distinguish transport failures from upstream HTTP error responses
//!
//! # Design Decisions
//! - Exactly one attempt per call; the dispatcher never retries
//! - A 4xx/5xx from the upstream is a success here: it carries a response
//!   to relay, which is not the client's business to judge
//! - Timeout errors are distinct from other transport faults so logs can
//!   tell a slow upstream from an unreachable one

use std::time::Duration;

use axum::body::Body;
use hyper::body::Incoming;
use hyper::{Request, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::TimeoutConfig;

/// Errors from a single upstream call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream did not produce a response within the ceiling.
    #[error("upstream did not respond within {0} seconds")]
    Timeout(u64),

    /// Connection refused, DNS failure, or another transport-level fault.
    #[error("{0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
}

impl UpstreamError {
    /// Failure text with the transport cause chain appended. The top-level
    /// Display for connect faults is just "client error (Connect)"; the
    /// refused-connection or DNS detail lives in the sources.
    pub fn detail(&self) -> String {
        match self {
            UpstreamError::Timeout(_) => self.to_string(),
            UpstreamError::Transport(e) => {
                let mut out = e.to_string();
                let mut source = std::error::Error::source(e);
                while let Some(cause) = source {
                    out.push_str(": ");
                    out.push_str(&cause.to_string());
                    source = cause.source();
                }
                out
            }
        }
    }
}

/// Result of one forwarding attempt. The success arm carries whatever the
/// upstream answered, error statuses included.
pub type UpstreamResult = Result<Response<Incoming>, UpstreamError>;

/// HTTP client for forwarding requests to upstream services.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl UpstreamClient {
    /// Build a client honoring the configured timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
            timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }

    /// Execute one outbound request, bounded by the per-call ceiling.
    pub async fn send(&self, request: Request<Body>) -> UpstreamResult {
        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(UpstreamError::Transport(e)),
            Err(_) => Err(UpstreamError::Timeout(self.timeout.as_secs())),
        }
    }
}

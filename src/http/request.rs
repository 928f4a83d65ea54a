//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4, added as early as possible)
//! - Build the outbound request for a matched route: target URL, headers,
//!   body
//! - Enforce the body rules: buffer-and-forward for POST/PUT/PATCH, drop for
//!   everything else
//!
//! # Design Decisions
//! - The inbound request is consumed, never mutated in place; the outbound
//!   request owns independent headers
//! - Bodies for body-carrying methods are fully buffered (bounded) so
//!   emptiness can be inspected and nothing reads a stream twice
//! - Hop-by-hop headers, Host, and Content-Length are never copied; the
//!   client recomputes framing for the outbound body

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{Method, Request};
use thiserror::Error;
use tower::{Layer, Service};
use uuid::Uuid;

use crate::routing::Route;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation id assigned to an inbound request, stored in its extensions.
#[derive(Debug, Clone)]
pub struct RequestId(String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accessor for the request id a [`RequestIdLayer`] stored on the request.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&RequestId>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&RequestId> {
        self.extensions().get::<RequestId>()
    }
}

/// Tower layer that guarantees every request carries an `x-request-id`
/// header and a [`RequestId`] extension. An id supplied by the caller is
/// kept; otherwise a fresh UUID v4 is assigned.
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Service produced by [`RequestIdLayer`].
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Ok(value) = HeaderValue::from_str(&id) {
            request.headers_mut().insert(X_REQUEST_ID, value);
        }
        request.extensions_mut().insert(RequestId(id));

        self.inner.call(request)
    }
}

/// Failure while assembling the outbound request.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The inbound body could not be buffered: read failure or over the
    /// configured limit. The caller's fault, answered with 400.
    #[error("failed to buffer request body: {0}")]
    Body(#[from] axum::Error),

    /// The outbound request could not be assembled. Should not occur for
    /// validated routes; answered with 500.
    #[error("failed to build outbound request: {0}")]
    Build(#[from] axum::http::Error),
}

/// Build the outbound request for `route` from the inbound one.
///
/// The target URL is the route's upstream base joined with the rewritten
/// path and the verbatim query string. For POST/PUT/PATCH the body is
/// buffered (at most `max_body_bytes`) and, when non-empty, the outbound
/// `Content-Type` is forced to `application/json`. Other methods forward no
/// body at all.
pub async fn build_proxy_request(
    request: Request<Body>,
    route: &Route,
    max_body_bytes: usize,
) -> Result<Request<Body>, TransformError> {
    let (parts, body) = request.into_parts();

    let rewritten = route.rewrite_path(parts.uri.path());
    let target = match parts.uri.query() {
        Some(query) if !query.is_empty() => {
            format!("{}{}?{}", route.upstream, rewritten, query)
        }
        _ => format!("{}{}", route.upstream, rewritten),
    };

    let buffered = if carries_body(&parts.method) {
        Some(axum::body::to_bytes(body, max_body_bytes).await?)
    } else {
        None
    };

    let mut builder = Request::builder().method(parts.method).uri(target);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            if is_skipped_header(name) {
                continue;
            }
            headers.insert(name.clone(), value.clone());
        }
        if let Some(bytes) = &buffered {
            if !bytes.is_empty() {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
        }
    }

    let body = match buffered {
        Some(bytes) => Body::from(bytes),
        None => Body::empty(),
    };

    Ok(builder.body(body)?)
}

/// Methods that conventionally carry a request body.
fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Headers never copied to the outbound request: hop-by-hop headers per
/// RFC 9110 §7.6.1, plus Host and Content-Length, which belong to the
/// outbound connection.
fn is_skipped_header(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "host"
            | "content-length"
            | "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

//! Response relay and synthesis.
//!
//! # Responsibilities
//! - Relay upstream responses to the caller with status and body intact
//! - Strip hop-by-hop headers and stamp the canonical Content-Type
//! - Synthesize the JSON bodies for responses the gateway authors itself
//!
//! # Design Decisions
//! - Upstream bodies stream through without buffering
//! - An upstream 4xx/5xx already carries an answer and is relayed verbatim;
//!   only transport failures become a gateway-authored 503
//! - Every synthesized body is JSON so callers parse one error shape

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::BoxError;
use serde_json::{json, Value};

use crate::routing::Route;
use crate::upstream::UpstreamError;

/// Convert the outcome of one forwarding attempt into the response for the
/// original caller.
pub fn relay<B>(result: Result<hyper::Response<B>, UpstreamError>, route: &Route) -> Response
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    match result {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            parts
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Response::from_parts(parts, Body::new(body))
        }
        Err(error) => service_unavailable(&error, route),
    }
}

/// 503 for a route whose upstream could not be reached in time.
fn service_unavailable(error: &UpstreamError, route: &Route) -> Response {
    json_response(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({
            "error": "Service unavailable",
            "message": error.detail(),
            "service": route.upstream,
        }),
    )
}

/// 404 for paths no route claims.
pub fn not_found(path: &str) -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        json!({
            "error": "Not found",
            "path": path,
        }),
    )
}

/// 400 for inbound bodies that could not be read or exceed the size cap.
pub fn invalid_body(detail: &str) -> Response {
    json_response(
        StatusCode::BAD_REQUEST,
        json!({
            "error": "Invalid request body",
            "message": detail,
        }),
    )
}

/// 500 for faults inside the gateway itself.
pub fn internal_error(detail: &str) -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
            "error": "Internal error",
            "message": detail,
        }),
    )
}

/// Build a JSON response with the given status. Encoding a `Value` cannot
/// fail in practice; if it ever does, a plain-text 500 goes out instead of
/// a panic inside the handler.
pub fn json_response(status: StatusCode, body: Value) -> Response {
    match serde_json::to_vec(&body) {
        Ok(encoded) => (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            encoded,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode response body");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "response encoding failed",
            )
                .into_response()
        }
    }
}

/// Drop headers scoped to a single connection, per RFC 9110 §7.6.1. The
/// upstream body arrives already de-chunked, so Transfer-Encoding in
/// particular must not survive the relay.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    const HOP_BY_HOP: [&str; 8] = [
        "connection",
        "keep-alive",
        "proxy-authenticate",
        "proxy-authorization",
        "te",
        "trailers",
        "transfer-encoding",
        "upgrade",
    ];
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::routing::RouteTable;

    fn tts_route() -> RouteTable {
        RouteTable::from_config(&[RouteConfig {
            name: "Text-to-Speech Service".to_string(),
            path_prefix: "/tts".to_string(),
            upstream: "http://text-to-speech-service:80".to_string(),
            strip_prefix: true,
        }])
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_503() {
        let table = tts_route();
        let route = table.resolve("/tts").unwrap();

        let response = relay::<Body>(Err(UpstreamError::Timeout(30)), route);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = body_json(response).await;
        assert_eq!(body["error"], "Service unavailable");
        assert_eq!(body["message"], "upstream did not respond within 30 seconds");
        assert_eq!(body["service"], "http://text-to-speech-service:80");
    }

    #[tokio::test]
    async fn test_upstream_response_relayed_verbatim() {
        let table = tts_route();
        let route = table.resolve("/tts").unwrap();

        let upstream = hyper::Response::builder()
            .status(StatusCode::IM_A_TEAPOT)
            .header(CONTENT_TYPE, "text/html")
            .header("connection", "close")
            .header("x-served-by", "voices-1")
            .body(Body::from(r#"{"custom":"shape"}"#))
            .unwrap();

        let response = relay(Ok(upstream), route);
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(response.headers().get("connection").is_none());
        assert_eq!(response.headers().get("x-served-by").unwrap(), "voices-1");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"custom":"shape"}"#);
    }

    #[tokio::test]
    async fn test_not_found_shape() {
        let response = not_found("/nope");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Not found");
        assert_eq!(body["path"], "/nope");
    }

    #[tokio::test]
    async fn test_invalid_body_shape() {
        let response = invalid_body("length limit exceeded");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid request body");
        assert_eq!(body["message"], "length limit exceeded");
    }
}

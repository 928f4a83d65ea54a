//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the gateway's own endpoints
//! - Wire up middleware (tracing, request ID)
//! - Bind the server to a listener and drain on shutdown
//! - Dispatch every other request through route match, transform, forward,
//!   and relay

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    routing::{any, get},
    Router,
};
use chrono::Local;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::request::{build_proxy_request, RequestIdExt, RequestIdLayer, TransformError};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::upstream::UpstreamClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub client: UpstreamClient,
    pub max_body_bytes: usize,
}

/// HTTP server for the API gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let table = Arc::new(RouteTable::from_config(&config.routes));
        let client = UpstreamClient::new(&config.timeouts);

        let state = AppState {
            table,
            client,
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers. The gateway answers
    /// `/` and `/health` itself; everything else goes through the proxy path.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/", get(index_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until the
    /// shutdown channel fires. In-flight requests are drained before return.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Address the listener must bind, as configured.
    pub fn bind_address(&self) -> &str {
        &self.config.listener.bind_address
    }
}

/// Main proxy handler.
/// Resolves the route, rebuilds the request, forwards it, relays the answer.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .request_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Proxying request"
    );

    // 1. Match route
    let Some(route) = state.table.resolve(&path) else {
        tracing::warn!(request_id = %request_id, path = %path, "No route matched");
        metrics::record_request(method.as_str(), 404, "none", start_time);
        return response::not_found(&path);
    };

    // 2. Rebuild for the upstream
    let outbound = match build_proxy_request(request, route, state.max_body_bytes).await {
        Ok(outbound) => outbound,
        Err(e @ TransformError::Body(_)) => {
            tracing::warn!(
                request_id = %request_id,
                route = %route.name,
                error = %e,
                "Rejecting unreadable request body"
            );
            metrics::record_request(method.as_str(), 400, &route.name, start_time);
            return response::invalid_body(&e.to_string());
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route = %route.name,
                error = %e,
                "Failed to build outbound request"
            );
            metrics::record_request(method.as_str(), 500, &route.name, start_time);
            return response::internal_error(&e.to_string());
        }
    };

    // 3. Forward, exactly once
    let result = state.client.send(outbound).await;
    match &result {
        Ok(upstream_response) => {
            tracing::debug!(
                request_id = %request_id,
                route = %route.name,
                status = %upstream_response.status(),
                latency_ms = start_time.elapsed().as_millis() as u64,
                "Upstream responded"
            );
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route = %route.name,
                upstream = %route.upstream,
                error = %e.detail(),
                "Upstream request failed"
            );
        }
    }

    // 4. Relay
    let response = response::relay(result, route);
    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        &route.name,
        start_time,
    );
    response
}

/// Liveness endpoint answered by the gateway itself.
async fn health_handler() -> Response {
    response::json_response(
        StatusCode::OK,
        json!({
            "status": "OK",
            "service": "api-gateway",
            "timestamp": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }),
    )
}

/// Endpoint directory, built from the live route table.
async fn index_handler(State(state): State<AppState>) -> Response {
    let mut endpoints = serde_json::Map::new();
    endpoints.insert(
        "/health".to_string(),
        Value::String("Health check".to_string()),
    );
    for route in state.table.routes() {
        endpoints.insert(route.prefix.clone(), Value::String(route.name.clone()));
    }

    response::json_response(
        StatusCode::OK,
        json!({
            "message": "ReBuilder API Gateway",
            "endpoints": endpoints,
        }),
    )
}

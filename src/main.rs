//! ReBuilder API Gateway
//!
//! Single entry point for the ReBuilder service fleet, built with Tokio and
//! Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶  http/server (Axum, request ID, tracing)
//!                         │
//!                         ▼
//!                     routing/table (longest matching prefix wins)
//!                         │
//!                         ▼
//!                     http/request (rewrite path, filter headers)
//!                         │
//!                         ▼
//!                     upstream/client (one attempt, bounded by timeouts)
//!                         │
//!                         ▼
//!     Client Response ◀── http/response (relay or synthesize)
//!
//!     Cross-cutting: config, lifecycle, observability
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rebuilder_gateway::config::load_or_default;
use rebuilder_gateway::observability::metrics;
use rebuilder_gateway::GatewayServer;
use rebuilder_gateway::Shutdown;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "rebuilder-gateway",
    version,
    about = "API gateway for the ReBuilder services"
)]
struct Args {
    /// Path to a TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_or_default(args.config.as_deref())?;

    // Initialize tracing subscriber; RUST_LOG overrides the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "rebuilder_gateway={},tower_http=debug",
                    config.observability.log_level
                ))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "rebuilder-gateway starting"
    );

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    // Metrics exporter on its own listener
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.trigger(),
            Err(e) => tracing::error!(error = %e, "Failed to install Ctrl+C handler"),
        }
    });

    let server = GatewayServer::new(config);
    let listener = TcpListener::bind(server.bind_address()).await?;

    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

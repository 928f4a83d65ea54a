//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy path produces:
//!     → structured log events (tracing, initialized in main)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout log stream
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line on the proxy path
//! - Metric updates are cheap (atomic increments)

pub mod metrics;

//! Upstream communication subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request (built by http/request.rs)
//!     → client.rs (hyper client, connect + per-call timeouts)
//!     → UpstreamResult: upstream response (any status) or transport error
//!     → http/response.rs relays it to the caller
//! ```

pub mod client;

pub use client::{UpstreamClient, UpstreamError, UpstreamResult};

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, local endpoints, dispatch)
//!     → request.rs (assign request ID, rebuild for the upstream)
//!     → [route table picks the upstream]
//!     → [upstream client forwards, exactly once]
//!     → response.rs (relay or synthesize)
//!     → Send to caller
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::GatewayServer;

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → table.rs (longest-prefix lookup)
//!     → Return: matched Route or no match (404 at the dispatcher)
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → trim upstream URLs, freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod table;

pub use table::{Route, RouteTable};

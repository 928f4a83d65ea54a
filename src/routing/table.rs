//! Route table and prefix matching.
//!
//! # Responsibilities
//! - Compile route configuration into an immutable table
//! - Resolve a request path to a route (longest matching prefix wins)
//! - Apply the per-route path rewrite when forwarding
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards (thread-safe without locks)
//! - O(n) prefix scan; no regex, so matching cost is bounded and predictable
//! - Prefix matching is segment-boundary-aware: "/tts" matches "/tts" and
//!   "/tts/voices" but never "/ttsx"
//! - Explicit no-match rather than a silent default route

use crate::config::RouteConfig;

/// A compiled route: one path prefix mapped to one upstream service.
#[derive(Debug, Clone)]
pub struct Route {
    /// Human-readable service name (endpoint directory, logs).
    pub name: String,

    /// The matched path prefix.
    pub prefix: String,

    /// Upstream base URL with any trailing slash removed, so joining with
    /// a rewritten path never produces "//".
    pub upstream: String,

    /// Whether the matched prefix is stripped before forwarding.
    pub strip_prefix: bool,
}

impl Route {
    fn from_config(config: &RouteConfig) -> Self {
        Self {
            name: config.name.clone(),
            prefix: config.path_prefix.clone(),
            upstream: config.upstream.trim_end_matches('/').to_string(),
            strip_prefix: config.strip_prefix,
        }
    }

    /// Returns true if the path equals the prefix or continues it at a
    /// path-segment boundary. A bare "/" prefix is a catch-all.
    fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// The path to forward upstream. Stripping the prefix from a path that
    /// equals it yields "/", never an empty path.
    pub fn rewrite_path<'a>(&self, path: &'a str) -> &'a str {
        if !self.strip_prefix || self.prefix == "/" {
            return path;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some("") => "/",
            Some(rest) => rest,
            None => path,
        }
    }
}

/// Immutable mapping from path prefixes to upstream services.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile the configured routes into a table.
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        Self {
            routes: configs.iter().map(Route::from_config).collect(),
        }
    }

    /// Resolve a path to a route. When several prefixes match, the longest
    /// one wins; ties cannot occur because prefixes are unique.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|route| route.matches(path))
            .max_by_key(|route| route.prefix.len())
    }

    /// All compiled routes, in configuration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

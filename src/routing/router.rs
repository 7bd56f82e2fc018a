//! Route lookup.
//!
//! # Design Decisions
//! - Immutable after construction (shared via `Arc`, no locks)
//! - Routes sorted once by specificity; first hit is the most specific match
//! - O(n) scan, acceptable for the handful of backends a gateway fronts
//! - Explicit `None` on no match rather than a silent default

use crate::config::schema::GatewayConfig;
use crate::routing::matcher::{normalize_path, PathPattern};
use crate::security::access_control::AuthPolicy;

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub pattern: PathPattern,
    /// Logical backend name, used in logs and metrics.
    pub backend: String,
    /// Backend base URL without a trailing slash.
    pub base_url: String,
    pub policy: AuthPolicy,
}

impl Route {
    pub fn new(
        pattern: &str,
        backend: impl Into<String>,
        base_url: impl Into<String>,
        policy: AuthPolicy,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            pattern: PathPattern::parse(pattern),
            backend: backend.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        }
    }

    /// Backend URL for an inbound path (the full path, base path included).
    ///
    /// One trailing slash is dropped so `/x/` and `/x` reach the same target.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let path = normalize_path(path);
        match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", self.base_url, path, q),
            _ => format!("{}{}", self.base_url, path),
        }
    }
}

/// The gateway's route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    base_path: String,
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(base_path: &str, mut routes: Vec<Route>) -> Self {
        // Stable sort keeps declaration order among equally specific routes.
        routes.sort_by(|a, b| b.pattern.specificity().cmp(&a.pattern.specificity()));
        let base_path = match normalize_path(base_path) {
            "/" => String::new(),
            other => other.to_string(),
        };
        Self { base_path, routes }
    }

    /// Compile the table from configuration.
    ///
    /// Routes naming an unknown backend are skipped; validation reports them
    /// before a table is ever built from a loaded file.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let routes = config
            .routes
            .iter()
            .filter_map(|rc| match config.backends.get(&rc.backend) {
                Some(url) => Some(Route::new(&rc.path, rc.backend.clone(), url.clone(), rc.auth.clone())),
                None => {
                    tracing::warn!(path = %rc.path, backend = %rc.backend, "Route references unknown backend, skipping");
                    None
                }
            })
            .collect();
        Self::new(&config.base_path, routes)
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the most specific route for an inbound path.
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        let relative = self.strip_base(normalize_path(path))?;
        self.routes.iter().find(|r| r.pattern.matches(relative))
    }

    fn strip_base<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.base_path.is_empty() {
            return Some(path);
        }
        let rest = path.strip_prefix(self.base_path.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

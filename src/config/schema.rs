//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::security::access_control::AuthPolicy;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Path prefix every routable request lives under (e.g. "/api").
    pub base_path: String,

    /// Backend base URLs keyed by logical service name.
    pub backends: BTreeMap<String, String>,

    /// Route definitions mapping path patterns to backends.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Authorization and credential settings.
    pub security: SecurityConfig,

    /// Outbound request tweaks.
    pub outbound: OutboundConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let mut backends = BTreeMap::new();
        backends.insert("reservation".to_string(), "http://localhost:8081".to_string());

        let routes = ["/reservations/*", "/disponibilities/*", "/reviews/*"]
            .into_iter()
            .map(|path| RouteConfig {
                path: path.to_string(),
                backend: "reservation".to_string(),
                auth: AuthPolicy::AnyAuthenticated,
            })
            .collect();

        Self {
            listener: ListenerConfig::default(),
            base_path: "/api".to_string(),
            backends,
            routes,
            timeouts: TimeoutConfig::default(),
            security: SecurityConfig::default(),
            outbound: OutboundConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A single route: path pattern, backend name and required authorization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Path pattern relative to `base_path`, e.g. "/reservations/*".
    pub path: String,

    /// Key into `GatewayConfig::backends`.
    pub backend: String,

    /// Authorization required to use this route.
    #[serde(default)]
    pub auth: AuthPolicy,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for one backend call (send + full response body) in seconds.
    pub backend_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Whole inbound request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            backend_secs: 30,
            connect_secs: 5,
            request_secs: 60,
        }
    }
}

/// How the authorization gate treats route policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// Route policies are evaluated for every request.
    #[default]
    Enforce,
    /// Every request is allowed. Security is disabled.
    PermitAll,
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub mode: SecurityMode,

    /// Realm announced in `WWW-Authenticate` challenges.
    pub realm: String,

    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,

    /// Seeded credential store.
    pub users: Vec<UserConfig>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            mode: SecurityMode::Enforce,
            realm: "api-gateway".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
            users: Vec::new(),
        }
    }
}

/// A user entry for the in-memory credential store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub username: String,

    /// bcrypt hash of the password (`$2b$<cost>$...`).
    pub password_hash: String,

    #[serde(default)]
    pub roles: Vec<String>,
}

/// Outbound request configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutboundConfig {
    /// When set, overrides `Accept-Encoding` on every backend request.
    pub accept_encoding: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

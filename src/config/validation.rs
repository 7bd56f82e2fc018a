//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing backends)
//! - Check backend URLs are absolute `http` URLs
//! - Detect duplicate routes and users
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: &GatewayConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::routing::matcher::PathPattern;
use crate::security::access_control::AuthPolicy;
use crate::security::identity::is_bcrypt_hash;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("base_path '{0}' must start with '/'")]
    BasePath(String),

    #[error("backend '{name}' has invalid URL '{url}': {reason}")]
    BackendUrl { name: String, url: String, reason: String },

    #[error("route '{0}' must start with '/'")]
    RoutePath(String),

    #[error("route '{path}' references unknown backend '{backend}'")]
    UnknownBackend { path: String, backend: String },

    #[error("route '{0}' is defined more than once")]
    DuplicateRoute(String),

    #[error("route '{0}' requires an empty role name")]
    EmptyRole(String),

    #[error("user '{0}' is defined more than once")]
    DuplicateUser(String),

    #[error("user '{0}' password_hash must be a bcrypt hash ($2b$<cost>$...)")]
    PasswordHash(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.request_secs ({request_secs}) must exceed timeouts.backend_secs ({backend_secs})")]
    RequestTimeoutTooShort { request_secs: u64, backend_secs: u64 },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if !config.base_path.starts_with('/') {
        errors.push(ValidationError::BasePath(config.base_path.clone()));
    }

    for (name, url) in &config.backends {
        if let Err(reason) = check_backend_url(url) {
            errors.push(ValidationError::BackendUrl {
                name: name.clone(),
                url: url.clone(),
                reason,
            });
        }
    }

    let mut seen_patterns = HashSet::new();
    for route in &config.routes {
        if !route.path.starts_with('/') {
            errors.push(ValidationError::RoutePath(route.path.clone()));
        }
        if !config.backends.contains_key(&route.backend) {
            errors.push(ValidationError::UnknownBackend {
                path: route.path.clone(),
                backend: route.backend.clone(),
            });
        }
        if !seen_patterns.insert(PathPattern::parse(&route.path).to_string()) {
            errors.push(ValidationError::DuplicateRoute(route.path.clone()));
        }
        if let AuthPolicy::RoleRequired(role) = &route.auth {
            if role.trim().is_empty() {
                errors.push(ValidationError::EmptyRole(route.path.clone()));
            }
        }
    }

    let mut seen_users = HashSet::new();
    for user in &config.security.users {
        if !seen_users.insert(user.username.as_str()) {
            errors.push(ValidationError::DuplicateUser(user.username.clone()));
        }
        if !is_bcrypt_hash(user.password_hash.trim()) {
            errors.push(ValidationError::PasswordHash(user.username.clone()));
        }
    }

    if config.timeouts.backend_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("backend_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    // A backend timeout must surface as 502 before the inbound request times out.
    if config.timeouts.request_secs <= config.timeouts.backend_secs {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_secs: config.timeouts.request_secs,
            backend_secs: config.timeouts.backend_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_backend_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    // TLS to backends is out of scope; the pooled client speaks plain HTTP.
    if url.scheme() != "http" {
        return Err(format!("scheme '{}' is not supported, use http", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment prefix for backend URL overrides, e.g. `GATEWAY_BACKEND_RESERVATION`.
pub const BACKEND_ENV_PREFIX: &str = "GATEWAY_BACKEND_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, std::env::vars())
}

/// Parse and validate config text with the given environment.
pub fn parse_config<I>(content: &str, env: I) -> Result<GatewayConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut config: GatewayConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;
    normalize(&mut config);
    Ok(config)
}

/// Replace backend URLs from `GATEWAY_BACKEND_<NAME>` variables.
///
/// `<NAME>` is matched case-insensitively against configured backend names;
/// `-` in a backend name corresponds to `_` in the variable.
pub fn apply_env_overrides<I>(config: &mut GatewayConfig, env: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in env {
        let Some(suffix) = key.strip_prefix(BACKEND_ENV_PREFIX) else {
            continue;
        };
        let target = config
            .backends
            .keys()
            .find(|name| name.replace('-', "_").eq_ignore_ascii_case(suffix))
            .cloned();
        match target {
            Some(name) => {
                tracing::info!(backend = %name, url = %value, "Backend URL overridden from environment");
                config.backends.insert(name, value);
            }
            None => tracing::warn!(variable = %key, "No backend matches environment override"),
        }
    }
}

fn normalize(config: &mut GatewayConfig) {
    for url in config.backends.values_mut() {
        let trimmed = url.trim_end_matches('/').len();
        url.truncate(trimmed);
    }
}

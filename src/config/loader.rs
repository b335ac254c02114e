//! Configuration loading from disk and the environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
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

/// Apply `ELEMENTS_*` and `API_PORT` overrides from `lookup`.
///
/// Unparsable numeric values are reported as validation errors rather than
/// silently ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), Vec<ValidationError>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    let parse_port = |var: &str, value: String, errors: &mut Vec<ValidationError>| {
        value
            .trim()
            .parse::<u16>()
            .map_err(|_| errors.push(ValidationError::new(var, format!("`{}` is not a port", value))))
            .ok()
    };

    if let Some(host) = lookup("ELEMENTS_HOST") {
        config.elements.host = host;
    }
    if let Some(port) = lookup("ELEMENTS_PORT").and_then(|v| parse_port("ELEMENTS_PORT", v, &mut errors)) {
        config.elements.port = port;
    }
    if let Some(user) = lookup("ELEMENTS_RPC_USER") {
        config.elements.user = user;
    }
    if let Some(password) = lookup("ELEMENTS_RPC_PASSWORD") {
        config.elements.password = password;
    }
    if let Some(port) = lookup("API_PORT").and_then(|v| parse_port("API_PORT", v, &mut errors)) {
        config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{}", port),
        };
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse a TOML document, apply overrides and validate.
pub fn load_config_str<F>(content: &str, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: GatewayConfig = toml::from_str(content)?;

    apply_env_overrides(&mut config, lookup).map_err(ConfigError::Validation)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration from an optional TOML file plus the process environment.
///
/// Without a file, defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let content = match path {
        Some(path) => fs::read_to_string(path)?,
        None => String::new(),
    };

    load_config_str(&content, |var| std::env::var(var).ok())
}

// src/config/mod.rs
//! Pipeline configuration: non-secret settings from TOML, secrets from env.

pub mod ai;
pub mod settings;

pub use settings::Settings;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Read a required env var. Blank values count as missing.
pub fn require_env(var: &'static str) -> Result<String, ConfigError> {
    optional_env(var).ok_or(ConfigError::Missing(var))
}

/// Read an optional env var, trimmed; blank values map to `None`.
pub fn optional_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

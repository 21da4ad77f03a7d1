//! Configuration error module.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error when loading or parsing the configuration sources.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// Error when validating the configuration.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// Other configuration errors.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        ConfigError::LoadError(error.to_string())
    }
}

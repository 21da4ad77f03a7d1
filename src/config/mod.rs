//! Configuration for the Banyan RPC runtime.
//!
//! Settings load from an optional TOML file and are overridden by `BANYAN_`
//! environment variables. Every section validates before use.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::config::ConfigError;

pub mod server;

pub use server::ServerConfig;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A trait for configuration sections that can be validated.
pub trait Validate {
    /// Validates that the configuration is correct.
    fn validate(&self) -> ConfigResult<()>;
}

/// Main configuration for the runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BanyanConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Log configuration
    pub log: LogConfig,
}

impl Validate for BanyanConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to log in JSON format
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Validate for LogConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid log level: {other}"
            ))),
        }
    }
}

/// Loads configuration from an optional file with environment overrides.
#[derive(Debug)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a loader reading `config_path` (if given) and environment
    /// variables prefixed `env_prefix`.
    pub fn new<P: AsRef<Path>>(config_path: Option<P>, env_prefix: &str) -> Self {
        Self {
            config_path: config_path.map(|path| path.as_ref().to_path_buf()),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> ConfigResult<BanyanConfig> {
        let mut builder = Config::builder();
        if let Some(path) = &self.config_path {
            builder = builder.add_source(File::from(path.as_path()));
        }
        builder = builder.add_source(Environment::with_prefix(&self.env_prefix).separator("__"));
        let loaded: BanyanConfig = builder
            .build()
            .map_err(ConfigError::from)?
            .try_deserialize()
            .map_err(ConfigError::from)?;
        loaded.validate()?;
        Ok(loaded)
    }
}

static GLOBAL_CONFIG: OnceCell<BanyanConfig> = OnceCell::new();

/// Installs the process-wide configuration. Fails when already installed.
pub fn init_global_config(config: BanyanConfig) -> ConfigResult<()> {
    GLOBAL_CONFIG
        .set(config)
        .map_err(|_| ConfigError::Other("configuration already initialized".to_string()))
}

/// The process-wide configuration, defaulted when never installed.
pub fn global_config() -> &'static BanyanConfig {
    GLOBAL_CONFIG.get_or_init(BanyanConfig::default)
}

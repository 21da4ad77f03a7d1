//! Server configuration: transport addresses and the HTTP service path.

use serde::{Deserialize, Serialize};

use super::{ConfigResult, Validate};
use crate::error::config::ConfigError;
use crate::transport::Uri;

/// Where the transports bind and where the HTTP service is presented.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP transport binds.
    pub bind: String,

    /// Port the HTTP transport binds.
    pub port: u16,

    /// URL path at which the service is presented over HTTP.
    pub path: String,

    /// URI at which to bind the request/reply socket.
    pub rep_uri: String,

    /// URI at which to bind the publish socket.
    pub pub_uri: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            path: "/jsonrpc".to_string(),
            rep_uri: "tcp://127.0.0.1:5555".to_string(),
            pub_uri: "tcp://127.0.0.1:5556".to_string(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "port must be greater than 0".to_string(),
            ));
        }
        // The URL path must not specify a scheme, authority, query or fragment.
        if !self.path.starts_with('/')
            || self.path.contains("://")
            || self.path.contains('?')
            || self.path.contains('#')
        {
            return Err(ConfigError::ValidationError(format!(
                "bad path: {}",
                self.path
            )));
        }
        for uri in [&self.rep_uri, &self.pub_uri] {
            Uri::parse(uri)
                .map_err(|error| ConfigError::ValidationError(error.to_string()))?;
        }
        Ok(())
    }
}

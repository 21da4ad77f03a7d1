//! Error module for the Banyan RPC runtime.
//!
//! Process-level errors live here; wire-level errors are protocol data and
//! stay in `protocol::jsonrpc::error` as [`crate::protocol::RpcError`]
//! values.

use thiserror::Error;

pub mod config;
pub mod transport;

pub use config::ConfigError;
pub use transport::TransportError;

/// Result type alias used throughout the runtime.
pub type BanyanResult<T> = Result<T, BanyanError>;

/// Core error enum for the Banyan RPC runtime.
#[derive(Error, Debug)]
pub enum BanyanError {
    /// Errors occurring during configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors in the socket and HTTP transports.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom error with message for cases without a specific type.
    #[error("{0}")]
    Custom(String),
}

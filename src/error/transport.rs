//! Transport error module.

use std::io;
use thiserror::Error;

/// Errors that can occur in the socket and HTTP transports.
#[derive(Error, Debug)]
pub enum TransportError {
    /// A transport URI failed to normalize.
    #[error("bad URI: {0}")]
    BadUri(String),

    /// Error binding or talking on a socket.
    #[error("socket error: {0}")]
    Socket(#[from] io::Error),

    /// The peer closed the connection before the exchange completed.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Error serving the HTTP binding.
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Other transport errors.
    #[error("transport error: {0}")]
    Other(String),
}

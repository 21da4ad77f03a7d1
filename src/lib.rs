//! Banyan RPC Runtime Library
//!
//! This library contains the core components of the Banyan RPC runtime: the
//! JSON-RPC 2.0 wire layer with its asynchronous-call extension, the
//! YANG-style path map and selector, the data-tree transaction façade, and
//! the pluggable transports. The library is designed to be used by the binary
//! crate, but can also be used as a dependency by other projects.
//!
//! # Architecture
//!
//! - Strict component boundaries: the wire layer knows nothing of trees, the
//!   tree engine nothing of sockets
//! - Dispatch is serialized per service instance; the asynchronous call table
//!   is the only synchronization point with workers
//! - Comprehensive error handling: wire errors are protocol values, process
//!   errors are typed enums

// Re-export public modules
pub mod config;
pub mod error;
pub mod protocol;
pub mod services;
pub mod store;
pub mod transport;
pub mod tree;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

/// Version information for the Banyan RPC runtime.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

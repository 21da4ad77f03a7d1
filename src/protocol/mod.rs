//! Protocol module for the Banyan RPC runtime.
//!
//! This module implements the JSON-RPC 2.0 wire format, the service
//! dispatcher, and the asynchronous-call extension.

// JSON-RPC 2.0 implementation
pub mod jsonrpc;

// Re-export common protocol components
pub use self::jsonrpc::{MethodError, MethodTable, Methods, ParamSpec, RpcError, Service};

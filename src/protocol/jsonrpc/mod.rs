// Copyright (c) 2025 Banyan RPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! JSON-RPC 2.0 message and service implementation.
//!
//! A service may be implemented with synchronous methods (as per the
//! [JSON-RPC 2.0 specification](https://www.jsonrpc.org/specification)),
//! asynchronous methods (as per the extension below), or a mixture.
//!
//! Asynchronous methods are built on top of ordinary request/response
//! exchanges. A client indicates a preference for asynchronous execution by
//! including a `metadata` object with an `async` property in the request. If
//! the service has no asynchronous implementation of the method, the call
//! executes synchronously. Otherwise a unique call handle is established
//! (allocated by the server when the `async` value is `true`, adopted from
//! the client otherwise) and the method is invoked. If the implementation
//! reports a result or error immediately, a terminal response is returned
//! (the call completes as a synchronous call would). Otherwise the response
//! carries the handle in `metadata.async`, and the client polls by sending a
//! request naming that handle until it receives the terminal response, which
//! consumes the handle.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use banyan_rpc_lib::protocol::jsonrpc::{MethodTable, ParamSpec, Service};
//! use serde_json::json;
//!
//! let mut table = MethodTable::new();
//! table.sync("add", ParamSpec::required(&["a", "b"]), |args| {
//!     match (args[0].as_i64(), args[1].as_i64()) {
//!         (Some(a), Some(b)) => Ok(json!(a + b)),
//!         _ => Err(banyan_rpc_lib::protocol::jsonrpc::MethodError::failed("not a number")),
//!     }
//! });
//! let service = Service::new(Arc::new(table));
//!
//! let response = service.handle_request(
//!     r#"{"jsonrpc": "2.0", "id": 1, "method": "add", "params": [2, 3]}"#,
//! );
//! let value: serde_json::Value = serde_json::from_str(&response).unwrap();
//! assert_eq!(value, json!({"jsonrpc": "2.0", "id": 1, "result": 5}));
//! ```

pub mod error;
pub mod method;
pub mod service;
pub mod types;

// Re-exports
pub use error::{ErrorCode, RpcError};
pub use method::{AsyncHandler, MethodError, MethodTable, Methods, ParamSpec, SyncHandler};
pub use service::{CallHandle, PendingTable, Service};
pub use types::{AsyncCall, FormError, Params, Request, Response, ResponseBody};

#[cfg(test)]
mod tests;

// Copyright (c) 2025 Banyan RPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Service dispatch and the asynchronous call table.
//!
//! A [`Service`] owns a method resolver and the table of in-flight
//! asynchronous calls. [`Service::handle_request`] takes one JSON-encoded
//! request string to one JSON-encoded response string; failures never escape
//! it. Dispatch is serialized per service instance: transports may
//! parallelize, the service will not.
//!
//! Asynchronous execution rides on plain request/response exchanges: the
//! first request establishes a pending record under a call handle and answers
//! with that handle in `metadata.async`; the implementation reports through a
//! [`CallHandle`] whenever it is done; a later request naming the handle
//! collects the terminal response and consumes the record.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use super::error::RpcError;
use super::method::{MethodError, Methods, SyncHandler};
use super::types::{AsyncCall, Params, Request, Response};

/// One in-flight asynchronous call. At most one of `result` and `error` is
/// ever set.
#[derive(Debug, Default)]
struct PendingCall {
    result: Option<Value>,
    error: Option<RpcError>,
}

impl PendingCall {
    fn is_terminal(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }
}

/// What a collection attempt observed: a terminal state (removed on return)
/// or a still-pending call.
enum Collected {
    Result(Value),
    Error(RpcError),
    Pending,
}

/// The table of in-flight asynchronous calls.
///
/// This is the only synchronization point between async workers and the
/// dispatcher. All three operations (insert pending, record terminal state,
/// collect-and-remove) are atomic with respect to each other; a late
/// `result`/`error` for an unknown or already-terminal handle is silently
/// ignored.
#[derive(Debug, Default)]
pub struct PendingTable {
    calls: Mutex<HashMap<String, PendingCall>>,
}

impl PendingTable {
    fn insert(&self, handle: &str) {
        self.calls
            .lock()
            .insert(handle.to_string(), PendingCall::default());
    }

    fn contains(&self, handle: &str) -> bool {
        self.calls.lock().contains_key(handle)
    }

    /// Records the result of the call at `handle`.
    pub fn result(&self, handle: &str, value: Value) {
        let mut calls = self.calls.lock();
        if let Some(call) = calls.get_mut(handle) {
            if !call.is_terminal() {
                call.result = Some(value);
            }
        }
    }

    /// Records the failure of the call at `handle`.
    pub fn error(&self, handle: &str, error: RpcError) {
        let mut calls = self.calls.lock();
        if let Some(call) = calls.get_mut(handle) {
            if !call.is_terminal() {
                call.error = Some(error);
            }
        }
    }

    fn collect(&self, handle: &str) -> Collected {
        let mut calls = self.calls.lock();
        let terminal = match calls.get(handle) {
            Some(call) => call.is_terminal(),
            None => return Collected::Pending,
        };
        if !terminal {
            return Collected::Pending;
        }
        // Terminal: consume the record. Errors take precedence.
        let call = calls.remove(handle).unwrap_or_default();
        if let Some(error) = call.error {
            Collected::Error(error)
        } else if let Some(result) = call.result {
            Collected::Result(result)
        } else {
            Collected::Pending
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.calls.lock().len()
    }
}

/// The handle an asynchronous implementation reports through.
///
/// Cheap to clone; implementations park clones wherever the eventual
/// completion will come from.
#[derive(Clone)]
pub struct CallHandle {
    handle: String,
    table: Arc<PendingTable>,
}

impl CallHandle {
    /// The opaque handle string identifying this call.
    pub fn id(&self) -> &str {
        &self.handle
    }

    /// Reports the call's result.
    pub fn result(&self, value: Value) {
        self.table.result(&self.handle, value);
    }

    /// Reports the call's failure.
    pub fn error(&self, error: RpcError) {
        self.table.error(&self.handle, error);
    }

    /// Reports the call's failure as an internal error with `detail`.
    pub fn fail(&self, detail: impl std::fmt::Display) {
        self.error(RpcError::internal(detail));
    }
}

impl std::fmt::Debug for CallHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallHandle")
            .field("handle", &self.handle)
            .finish()
    }
}

/// A JSON-RPC 2.0 service: a method resolver plus the per-instance
/// asynchronous call table.
pub struct Service {
    methods: Arc<dyn Methods>,
    pending: Arc<PendingTable>,
    // Serializes dispatch: one request is processed to completion (or to its
    // async-pending handoff) before the next is accepted.
    gate: Mutex<()>,
}

impl Service {
    /// Creates a service dispatching into `methods`.
    pub fn new(methods: Arc<dyn Methods>) -> Self {
        Self {
            methods,
            pending: Arc::new(PendingTable::default()),
            gate: Mutex::new(()),
        }
    }

    /// The service's asynchronous call table, for implementations completing
    /// calls from outside the dispatch path.
    pub fn pending(&self) -> Arc<PendingTable> {
        Arc::clone(&self.pending)
    }

    /// Handles one JSON-encoded request string and returns the JSON-encoded
    /// response string. Never fails: every failure becomes an error response.
    pub fn handle_request(&self, raw: &str) -> String {
        let response = match Request::parse(raw) {
            Ok(request) => {
                let _serialized = self.gate.lock();
                self.invoke(request)
            }
            Err(error) => Response::error(None, error),
        };
        response.to_wire()
    }

    fn invoke(&self, request: Request) -> Response {
        let Request {
            id,
            method,
            params,
            call,
        } = request;
        trace!(method = %method, "dispatching request");

        // Collection shortcut: a known handle wins over method resolution.
        if let AsyncCall::Handle(handle) = &call {
            if self.pending.contains(handle) {
                return self.collect(id, handle);
            }
        }
        if !matches!(call, AsyncCall::Off) {
            if let Some(implementation) = self.methods.resolve_async(&method) {
                return self.invoke_async(id, implementation, params.as_ref(), &call);
            }
        }
        if let Some(implementation) = self.methods.resolve_sync(&method) {
            return Self::invoke_sync(id, implementation, params.as_ref());
        }
        debug!(method = %method, "method not found");
        Response::error(id, RpcError::method_not_found())
    }

    /// Establishes the pending record, invokes the implementation, and
    /// collects whatever state the call is in afterwards.
    fn invoke_async(
        &self,
        id: Option<Value>,
        implementation: super::method::AsyncHandler,
        params: Option<&Params>,
        call: &AsyncCall,
    ) -> Response {
        let handle = match call.to_handle() {
            Some(handle) => handle,
            // Unreachable from invoke(); answer as if the method were absent.
            None => return Response::error(id, RpcError::method_not_found()),
        };
        // The record must exist before the implementation runs so that an
        // immediate completion lands in the table.
        self.pending.insert(&handle);
        let call_handle = CallHandle {
            handle: handle.clone(),
            table: Arc::clone(&self.pending),
        };
        if let Err(failure) = implementation(call_handle, params) {
            match failure {
                MethodError::InvalidParams(detail) => {
                    self.pending.error(&handle, RpcError::invalid_params(detail));
                }
                other => {
                    self.pending.error(&handle, RpcError::internal(other));
                }
            }
        }
        self.collect(id, &handle)
    }

    fn collect(&self, id: Option<Value>, handle: &str) -> Response {
        match self.pending.collect(handle) {
            Collected::Error(error) => Response::error(id, error),
            Collected::Result(value) => Response::result(id, value),
            Collected::Pending => Response::pending(id, handle),
        }
    }

    fn invoke_sync(
        id: Option<Value>,
        implementation: SyncHandler,
        params: Option<&Params>,
    ) -> Response {
        match implementation(params) {
            Ok(value) => Response::result(id, value),
            Err(MethodError::InvalidParams(detail)) => {
                Response::error(id, RpcError::invalid_params(detail))
            }
            Err(failure) => Response::error(id, RpcError::internal(failure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pending_lifecycle() {
        let table = PendingTable::default();
        table.insert("h");
        assert!(table.contains("h"));
        assert!(matches!(table.collect("h"), Collected::Pending));
        // still present after a pending collection
        assert!(table.contains("h"));

        table.result("h", json!("v"));
        match table.collect("h") {
            Collected::Result(value) => assert_eq!(value, json!("v")),
            _ => panic!("expected result"),
        }
        // consumed: a second collection sees an unknown handle
        assert!(!table.contains("h"));
        assert!(matches!(table.collect("h"), Collected::Pending));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_error_takes_precedence_and_terminal_is_sticky() {
        let table = PendingTable::default();
        table.insert("h");
        table.error("h", RpcError::internal("boom"));
        // late result for a terminal handle is ignored
        table.result("h", json!("late"));
        match table.collect("h") {
            Collected::Error(error) => assert_eq!(error.message, "Internal error: boom"),
            _ => panic!("expected error"),
        }
    }

    #[test]
    fn test_reports_for_unknown_handles_are_ignored() {
        let table = PendingTable::default();
        table.result("ghost", json!(1));
        table.error("ghost", RpcError::internal("x"));
        assert!(!table.contains("ghost"));
    }
}

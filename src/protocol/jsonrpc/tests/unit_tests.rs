// Copyright (c) 2025 Banyan RPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Unit tests for service dispatch.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::protocol::jsonrpc::{MethodError, MethodTable, ParamSpec, Service};

fn fixture() -> Service {
    let mut table = MethodTable::new();
    table.sync("add", ParamSpec::required(&["a", "b"]), |args| {
        match (args[0].as_i64(), args[1].as_i64()) {
            (Some(a), Some(b)) => Ok(json!(a + b)),
            _ => Err(MethodError::failed("not a number")),
        }
    });
    table.sync("blow-up", ParamSpec::none(), |_| {
        Err(MethodError::failed("kaboom"))
    });
    table.sync("reserved", ParamSpec::none(), |_| Err(MethodError::Unsupported));
    table.asynchronous("tick", ParamSpec::none(), |call, _| {
        call.result(json!("tock"));
        Ok(())
    });
    table.asynchronous("park", ParamSpec::none(), |_call, _| Ok(()));
    Service::new(Arc::new(table))
}

fn call(service: &Service, request: &str) -> Value {
    serde_json::from_str(&service.handle_request(request)).unwrap()
}

#[test]
fn test_lenient_versions_dispatch() {
    let service = fixture();
    for version in ["\"2.0\"", "\"2\"", "2", "2.0"] {
        let response = call(
            &service,
            &format!(r#"{{"jsonrpc": {version}, "id": 1, "method": "add", "params": [1, 2]}}"#),
        );
        assert_eq!(response["result"], json!(3), "version {version}");
        assert_eq!(response["jsonrpc"], json!("2.0"));
    }
}

#[test]
fn test_notifications_are_still_answered() {
    // this runtime does not differentiate: a request without id is answered
    // with id null
    let service = fixture();
    let response = call(&service, r#"{"jsonrpc": "2.0", "method": "add", "params": [1, 2]}"#);
    assert_eq!(response, json!({"jsonrpc": "2.0", "id": null, "result": 3}));
}

#[test]
fn test_unsupported_maps_to_internal_with_literal_message() {
    let service = fixture();
    let response = call(&service, r#"{"jsonrpc": "2.0", "id": 1, "method": "reserved"}"#);
    assert_eq!(response["error"]["code"], json!(-32603));
    assert_eq!(
        response["error"]["message"],
        json!("Internal error: method not supported in this service")
    );
}

#[test]
fn test_failure_description_lands_in_internal_message() {
    let service = fixture();
    let response = call(&service, r#"{"jsonrpc": "2.0", "id": 1, "method": "blow-up"}"#);
    assert_eq!(response["error"]["message"], json!("Internal error: kaboom"));
}

#[test]
fn test_async_request_without_async_impl_runs_sync() {
    let service = fixture();
    let response = call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 1, "method": "add", "params": [2, 2], "metadata": {"async": true}}"#,
    );
    assert_eq!(response, json!({"jsonrpc": "2.0", "id": 1, "result": 4}));
}

#[test]
fn test_immediate_async_completion_is_terminal() {
    let service = fixture();
    let response = call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 1, "method": "tick", "metadata": {"async": true}}"#,
    );
    assert_eq!(response, json!({"jsonrpc": "2.0", "id": 1, "result": "tock"}));
}

#[test]
fn test_client_chosen_handle_is_adopted_verbatim() {
    let service = fixture();
    let response = call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 1, "method": "park", "metadata": {"async": "my-handle"}}"#,
    );
    assert_eq!(
        response,
        json!({"jsonrpc": "2.0", "id": 1, "metadata": {"async": "my-handle"}})
    );
}

#[test]
fn test_collection_shortcut_wins_over_method_resolution() {
    let service = fixture();
    call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 1, "method": "park", "metadata": {"async": "h"}}"#,
    );
    // the method name is nonsense, but "h" is a live handle so this collects
    let response = call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 2, "method": "no-such-method", "metadata": {"async": "h"}}"#,
    );
    assert_eq!(
        response,
        json!({"jsonrpc": "2.0", "id": 2, "metadata": {"async": "h"}})
    );
}

#[test]
fn test_out_of_band_completion_then_single_collection() {
    let service = fixture();
    call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 1, "method": "park", "metadata": {"async": "job"}}"#,
    );
    // a worker completes the call through the pending table
    service.pending().result("job", json!(42));

    let response = call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 2, "method": "park", "metadata": {"async": "job"}}"#,
    );
    assert_eq!(response, json!({"jsonrpc": "2.0", "id": 2, "result": 42}));

    // consumed: the same handle now takes the async-dispatch path anew
    let response = call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 3, "method": "park", "metadata": {"async": "job"}}"#,
    );
    assert_eq!(
        response,
        json!({"jsonrpc": "2.0", "id": 3, "metadata": {"async": "job"}})
    );
}

#[test]
fn test_false_async_value_means_sync() {
    let service = fixture();
    let response = call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 1, "method": "tick", "metadata": {"async": false}}"#,
    );
    // no sync implementation of tick exists
    assert_eq!(response["error"]["code"], json!(-32601));
}

#[test]
fn test_structured_async_value_is_invalid_request() {
    let service = fixture();
    let response = call(
        &service,
        r#"{"jsonrpc": "2.0", "id": 1, "method": "tick", "metadata": {"async": {"no": 1}}}"#,
    );
    assert_eq!(
        response,
        json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": {"code": -32600, "message": "Invalid Request"},
        })
    );
}

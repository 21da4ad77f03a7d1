//! A JSON-RPC 2.0 asynchronous key/value store service.
//!
//! `set` and `del` are synchronous; `get` is asynchronous. A get on a missing
//! key parks its call handle on a watch list for that key, and the next `set`
//! of the key completes every parked call with the new value.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::protocol::jsonrpc::{CallHandle, MethodError, MethodTable, ParamSpec, Service};

#[derive(Default)]
struct KeyValState {
    store: Mutex<HashMap<String, Value>>,
    watch: Mutex<HashMap<String, Vec<CallHandle>>>,
}

fn key_of(value: &Value) -> Result<String, MethodError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MethodError::InvalidParams("key must be a string".to_string()))
}

/// Creates the key/value service.
pub fn service() -> Service {
    let state = Arc::new(KeyValState::default());
    let mut table = MethodTable::new();

    let shared = Arc::clone(&state);
    table.sync("set", ParamSpec::required(&["key", "val"]), move |args| {
        let key = key_of(&args[0])?;
        shared.store.lock().insert(key.clone(), args[1].clone());
        if let Some(parked) = shared.watch.lock().remove(&key) {
            for call in parked {
                call.result(args[1].clone());
            }
        }
        Ok(Value::Null)
    });

    let shared = Arc::clone(&state);
    table.sync("del", ParamSpec::required(&["key"]), move |args| {
        shared.store.lock().remove(&key_of(&args[0])?);
        Ok(Value::Null)
    });

    let shared = Arc::clone(&state);
    table.asynchronous("get", ParamSpec::required(&["key"]), move |call, args| {
        let key = key_of(&args[0])?;
        let existing = shared.store.lock().get(&key).cloned();
        match existing {
            Some(value) => call.result(value),
            None => shared.watch.lock().entry(key).or_default().push(call),
        }
        Ok(())
    });

    Service::new(Arc::new(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(service: &Service, request: &str) -> Value {
        serde_json::from_str(&service.handle_request(request)).unwrap()
    }

    #[test]
    fn test_get_of_present_key_completes_immediately() {
        let service = service();
        call(
            &service,
            r#"{"jsonrpc": "2.0", "id": 1, "method": "set", "params": {"key": "k", "val": "v"}}"#,
        );
        let response = call(
            &service,
            r#"{"jsonrpc": "2.0", "id": 2, "method": "get", "params": {"key": "k"}, "metadata": {"async": true}}"#,
        );
        assert_eq!(response, json!({"jsonrpc": "2.0", "id": 2, "result": "v"}));
    }

    #[test]
    fn test_get_parks_until_set_then_collects_once() {
        let service = service();
        let pending = call(
            &service,
            r#"{"jsonrpc": "2.0", "id": "a", "method": "get", "params": {"key": "k"}, "metadata": {"async": true}}"#,
        );
        let handle = pending["metadata"]["async"].as_str().unwrap().to_string();
        assert_eq!(pending["id"], json!("a"));

        // still pending: polling returns the same handle
        let again = call(
            &service,
            &format!(
                r#"{{"jsonrpc": "2.0", "id": "b", "method": "get", "metadata": {{"async": "{handle}"}}}}"#
            ),
        );
        assert_eq!(again["metadata"]["async"], json!(handle));

        call(
            &service,
            r#"{"jsonrpc": "2.0", "id": 3, "method": "set", "params": {"key": "k", "val": "v"}}"#,
        );
        let collected = call(
            &service,
            &format!(
                r#"{{"jsonrpc": "2.0", "id": "c", "method": "get", "metadata": {{"async": "{handle}"}}}}"#
            ),
        );
        assert_eq!(collected, json!({"jsonrpc": "2.0", "id": "c", "result": "v"}));

        // the handle is consumed: naming it again re-dispatches and parks anew
        call(
            &service,
            r#"{"jsonrpc": "2.0", "id": 4, "method": "del", "params": {"key": "k"}}"#,
        );
        let reused = call(
            &service,
            &format!(
                r#"{{"jsonrpc": "2.0", "id": "d", "method": "get", "params": {{"key": "k"}}, "metadata": {{"async": "{handle}"}}}}"#
            ),
        );
        assert_eq!(reused["metadata"]["async"], json!(handle));
    }

    #[test]
    fn test_del_is_idempotent() {
        let service = service();
        let response = call(
            &service,
            r#"{"jsonrpc": "2.0", "id": 5, "method": "del", "params": {"key": "ghost"}}"#,
        );
        assert_eq!(response, json!({"jsonrpc": "2.0", "id": 5, "result": null}));
    }

    #[test]
    fn test_async_binding_mismatch_lands_in_the_handle() {
        let service = service();
        // wrong argument name: the invalid-params error is recorded under the
        // handle and collected as the terminal response
        let response = call(
            &service,
            r#"{"jsonrpc": "2.0", "id": 6, "method": "get", "params": {"wrong": "k"}, "metadata": {"async": true}}"#,
        );
        assert_eq!(response["error"]["code"], json!(-32602));
        assert!(response["error"]["data"].as_str().unwrap().contains("'wrong'"));
    }
}

// Copyright (c) 2025 Banyan RPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Canonical value forming for JSON-RPC 2.0 message objects.
//!
//! A value type here is a pure forming function: given a raw decoded JSON
//! value, it returns the canonical form or fails with a typed error. Lexical
//! leniency lives in the forming functions (version `"2"` and `2` both form
//! `"2.0"`); everything downstream of forming only ever sees canonical values.

use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::error::RpcError;

/// A raw value failed to form a canonical value of the named kind.
#[derive(Debug, Error)]
#[error("not a valid {kind}: {value}")]
pub struct FormError {
    kind: &'static str,
    value: String,
}

impl FormError {
    pub(crate) fn new(kind: &'static str, value: &Value) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Checks a mapping against its declared structure: every mandatory key
/// present, every present key known. Element forming is left to the caller.
pub(crate) fn check_keys(
    map: &Map<String, Value>,
    mandatory: &[&str],
    optional: &[&str],
    kind: &'static str,
) -> Result<(), FormError> {
    for key in map.keys() {
        if !mandatory.contains(&key.as_str()) && !optional.contains(&key.as_str()) {
            return Err(FormError::new(kind, &Value::String(key.clone())));
        }
    }
    for key in mandatory {
        if !map.contains_key(*key) {
            return Err(FormError::new(kind, &Value::String((*key).to_string())));
        }
    }
    Ok(())
}

/// Forms the canonical protocol version `"2.0"`.
///
/// Accepts the strings `"2.0"` and `"2"` and the numbers `2` and `2.0`;
/// clients generated by lenient libraries ship either form.
pub fn form_version(value: &Value) -> Result<&'static str, FormError> {
    match value {
        Value::String(s) if s == "2.0" || s == "2" => Ok("2.0"),
        Value::Number(n) if n.as_f64() == Some(2.0) => Ok("2.0"),
        other => Err(FormError::new("version", other)),
    }
}

/// Forms a method name: any non-empty string not beginning with the reserved
/// `rpc.` prefix.
pub fn form_method(value: &Value) -> Result<String, FormError> {
    match value.as_str() {
        Some(name) if !name.is_empty() && !name.starts_with("rpc.") => Ok(name.to_string()),
        _ => Err(FormError::new("method", value)),
    }
}

/// Canonical request params: a positional list or a named mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Positional params
    List(Vec<Value>),

    /// Named params
    Map(Map<String, Value>),
}

impl Params {
    /// Forms canonical params from a raw decoded value.
    pub fn form(value: &Value) -> Result<Self, FormError> {
        match value {
            Value::Array(items) => Ok(Params::List(items.clone())),
            Value::Object(map) => Ok(Params::Map(map.clone())),
            other => Err(FormError::new("params", other)),
        }
    }

    /// Projects the canonical params back to a plain value.
    pub fn to_value(&self) -> Value {
        match self {
            Params::List(items) => Value::Array(items.clone()),
            Params::Map(map) => Value::Object(map.clone()),
        }
    }
}

/// The asynchronous-call request carried in the `metadata.async` extension.
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncCall {
    /// Synchronous execution requested (extension absent or falsy).
    Off,

    /// The client asked the server to allocate a fresh call handle (`true`).
    Allocate,

    /// The client supplied its own call handle.
    Handle(String),
}

impl AsyncCall {
    /// Forms the async-call value.
    ///
    /// `true` requests server allocation. `false`, `null`, the empty string
    /// and `0` all mean synchronous. Other strings and numbers are adopted as
    /// client-chosen handles (numbers via their decimal text). Structured
    /// values cannot name a handle and fail to form; in particular no boolean
    /// other than `true` is ever a handle.
    pub fn form(value: &Value) -> Result<Self, FormError> {
        match value {
            Value::Null | Value::Bool(false) => Ok(AsyncCall::Off),
            Value::Bool(true) => Ok(AsyncCall::Allocate),
            Value::String(s) if s.is_empty() => Ok(AsyncCall::Off),
            Value::String(s) => Ok(AsyncCall::Handle(s.clone())),
            Value::Number(n) if n.as_f64() == Some(0.0) => Ok(AsyncCall::Off),
            Value::Number(n) => Ok(AsyncCall::Handle(n.to_string())),
            other => Err(FormError::new("async call", other)),
        }
    }

    /// Returns the server-side handle for this call: the client handle
    /// verbatim, a fresh UUID v4 when the client sent `true`, and no handle
    /// for a synchronous call.
    pub fn to_handle(&self) -> Option<String> {
        match self {
            AsyncCall::Off => None,
            AsyncCall::Allocate => Some(Uuid::new_v4().to_string()),
            AsyncCall::Handle(handle) => Some(handle.clone()),
        }
    }

    fn to_value(&self) -> Option<Value> {
        match self {
            AsyncCall::Off => None,
            AsyncCall::Allocate => Some(Value::Bool(true)),
            AsyncCall::Handle(handle) => Some(Value::String(handle.clone())),
        }
    }
}

/// Forms the metadata extension object. `async` is its sole recognized key.
pub fn form_metadata(value: &Value) -> Result<AsyncCall, FormError> {
    let map = value
        .as_object()
        .ok_or_else(|| FormError::new("metadata", value))?;
    check_keys(map, &[], &["async"], "metadata")?;
    match map.get("async") {
        Some(raw) => AsyncCall::form(raw),
        None => Ok(AsyncCall::Off),
    }
}

/// A canonical JSON-RPC 2.0 request.
///
/// `id` distinguishes absent (`None`) from an explicit `null`
/// (`Some(Value::Null)`); the runtime answers both identically.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Request identifier; absence marks a notification.
    pub id: Option<Value>,

    /// Name of the method to invoke.
    pub method: String,

    /// Positional or named params.
    pub params: Option<Params>,

    /// Asynchronous-call extension.
    pub call: AsyncCall,
}

impl Request {
    /// Forms a request from a raw decoded value.
    pub fn form(value: &Value) -> Result<Self, FormError> {
        let map = value
            .as_object()
            .ok_or_else(|| FormError::new("request", value))?;
        check_keys(
            map,
            &["jsonrpc", "method"],
            &["params", "id", "metadata"],
            "request",
        )?;
        form_version(&map["jsonrpc"])?;
        let method = form_method(&map["method"])?;
        let params = map.get("params").map(Params::form).transpose()?;
        let call = map
            .get("metadata")
            .map(form_metadata)
            .transpose()?
            .unwrap_or(AsyncCall::Off);
        Ok(Self {
            id: map.get("id").cloned(),
            method,
            params,
            call,
        })
    }

    /// Parses and forms a request from a JSON-encoded string, classifying
    /// failures as parse error or invalid request.
    pub fn parse(raw: &str) -> Result<Self, RpcError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| RpcError::parse_error())?;
        Self::form(&value).map_err(|_| RpcError::invalid_request())
    }

    /// Serializes the canonical request back to a request object.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("jsonrpc".to_string(), json!("2.0"));
        map.insert("method".to_string(), json!(self.method));
        if let Some(params) = &self.params {
            map.insert("params".to_string(), params.to_value());
        }
        if let Some(id) = &self.id {
            map.insert("id".to_string(), id.clone());
        }
        if let Some(call) = self.call.to_value() {
            map.insert("metadata".to_string(), json!({ "async": call }));
        }
        Value::Object(map)
    }
}

/// The payload of a response: exactly one of result, error, or a pending
/// asynchronous call handle.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The method's return value.
    Result(Value),

    /// The failure reported for the call.
    Error(RpcError),

    /// The call is still running; collect later with this handle.
    Pending(String),
}

/// A canonical JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Echo of the request id; `null` on pre-dispatch failure.
    pub id: Value,

    /// Result, error, or pending handle.
    pub body: ResponseBody,
}

impl Response {
    /// Creates a result response for `id`.
    pub fn result(id: Option<Value>, value: Value) -> Self {
        Self {
            id: id.unwrap_or(Value::Null),
            body: ResponseBody::Result(value),
        }
    }

    /// Creates an error response for `id`.
    pub fn error(id: Option<Value>, error: RpcError) -> Self {
        Self {
            id: id.unwrap_or(Value::Null),
            body: ResponseBody::Error(error),
        }
    }

    /// Creates a pending response for `id`, telling the client the call can
    /// be collected with `handle`.
    pub fn pending(id: Option<Value>, handle: impl Into<String>) -> Self {
        Self {
            id: id.unwrap_or(Value::Null),
            body: ResponseBody::Pending(handle.into()),
        }
    }

    /// Serializes the response to a response object.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("jsonrpc".to_string(), json!("2.0"));
        map.insert("id".to_string(), self.id.clone());
        match &self.body {
            ResponseBody::Result(value) => {
                map.insert("result".to_string(), value.clone());
            }
            ResponseBody::Error(error) => {
                map.insert("error".to_string(), json!(error));
            }
            ResponseBody::Pending(handle) => {
                map.insert("metadata".to_string(), json!({ "async": handle }));
            }
        }
        Value::Object(map)
    }

    /// Serializes the response to its wire string.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(&self.to_value()).unwrap_or_else(|_| {
            // A response built from valid values always serializes; this is the
            // last-resort wire shape if it ever does not.
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error: response serialization"}}"#.to_string()
        })
    }
}

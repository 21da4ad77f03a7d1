// Copyright (c) 2025 Banyan RPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Error types for the JSON-RPC 2.0 message layer.
//!
//! This module defines error codes and the wire error object according to the
//! [JSON-RPC 2.0 specification](https://www.jsonrpc.org/specification#error_object).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{check_keys, FormError};

/// Standard JSON-RPC 2.0 error codes as defined in the specification.
///
/// The error codes from -32768 to -32000 are reserved for pre-defined errors.
/// Codes in -32099..=-32000 form the implementation-defined server error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Parse error (-32700)
    /// Invalid JSON was received by the server.
    ParseError = -32700,

    /// Invalid Request (-32600)
    /// The JSON sent is not a valid Request object.
    InvalidRequest = -32600,

    /// Method not found (-32601)
    /// The method does not exist / is not available.
    MethodNotFound = -32601,

    /// Invalid params (-32602)
    /// Invalid method parameter(s).
    InvalidParams = -32602,

    /// Internal error (-32603)
    /// Internal JSON-RPC error.
    InternalError = -32603,
}

impl ErrorCode {
    /// Returns the canonical message for the error code.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Returns the integer error code.
    pub fn code(&self) -> i64 {
        *self as i64
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> i64 {
        code as i64
    }
}

/// Inclusive range of the implementation-defined server error family.
pub const SERVER_ERROR_RANGE: std::ops::RangeInclusive<i64> = -32099..=-32000;

/// JSON-RPC error object carried in a Response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// The error code
    pub code: i64,

    /// A short description of the error
    pub message: String,

    /// Additional information about the error (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Creates a new error object.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured detail to the error object.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Creates a standard parse error.
    pub fn parse_error() -> Self {
        Self::new(ErrorCode::ParseError.code(), ErrorCode::ParseError.message())
    }

    /// Creates a standard invalid request error.
    pub fn invalid_request() -> Self {
        Self::new(
            ErrorCode::InvalidRequest.code(),
            ErrorCode::InvalidRequest.message(),
        )
    }

    /// Creates a standard method not found error.
    pub fn method_not_found() -> Self {
        Self::new(
            ErrorCode::MethodNotFound.code(),
            ErrorCode::MethodNotFound.message(),
        )
    }

    /// Creates a standard invalid params error. The mismatch detail travels in
    /// `data` so that clients can tell a dispatch failure from a runtime failure.
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidParams.code(),
            ErrorCode::InvalidParams.message(),
        )
        .with_data(Value::String(detail.into()))
    }

    /// Creates a standard internal error with its message formatted as
    /// `"Internal error: <detail>"`.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::InternalError.code(),
            format!("{}: {}", ErrorCode::InternalError.message(), detail),
        )
    }

    /// Creates an error in the server error family.
    ///
    /// `code` must lie in [`SERVER_ERROR_RANGE`]; out-of-range codes are clamped
    /// to the nearest bound.
    pub fn server_error(code: i64, message: impl Into<String>) -> Self {
        let code = code
            .max(*SERVER_ERROR_RANGE.start())
            .min(*SERVER_ERROR_RANGE.end());
        Self::new(code, message)
    }

    /// Forms an error object from a raw decoded value, checking the
    /// mandatory/optional key structure.
    pub fn form(value: &Value) -> Result<Self, FormError> {
        let map = value
            .as_object()
            .ok_or_else(|| FormError::new("error object", value))?;
        check_keys(map, &["code", "message"], &["data"], "error object")?;
        let code = map["code"]
            .as_i64()
            .ok_or_else(|| FormError::new("error code", &map["code"]))?;
        let message = map["message"]
            .as_str()
            .ok_or_else(|| FormError::new("error message", &map["message"]))?;
        Ok(Self {
            code,
            message: message.to_string(),
            data: map.get("data").cloned(),
        })
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_messages() {
        assert_eq!(ErrorCode::ParseError.message(), "Parse error");
        assert_eq!(ErrorCode::InvalidRequest.message(), "Invalid Request");
        assert_eq!(ErrorCode::MethodNotFound.message(), "Method not found");
        assert_eq!(ErrorCode::InvalidParams.message(), "Invalid params");
        assert_eq!(ErrorCode::InternalError.message(), "Internal error");
    }

    #[test]
    fn test_standard_errors() {
        let parse_error = RpcError::parse_error();
        assert_eq!(parse_error.code, -32700);
        assert_eq!(parse_error.message, "Parse error");

        let invalid_request = RpcError::invalid_request();
        assert_eq!(invalid_request.code, -32600);

        let method_not_found = RpcError::method_not_found();
        assert_eq!(method_not_found.code, -32601);

        let invalid_params = RpcError::invalid_params("expects 2 arguments, got 3");
        assert_eq!(invalid_params.code, -32602);
        assert_eq!(invalid_params.message, "Invalid params");
        assert_eq!(
            invalid_params.data,
            Some(json!("expects 2 arguments, got 3"))
        );

        let internal = RpcError::internal("division by zero");
        assert_eq!(internal.code, -32603);
        assert_eq!(internal.message, "Internal error: division by zero");
    }

    #[test]
    fn test_server_error_clamping() {
        assert_eq!(RpcError::server_error(-32050, "backend down").code, -32050);
        assert_eq!(RpcError::server_error(-31999, "too high").code, -32000);
        assert_eq!(RpcError::server_error(-40000, "too low").code, -32099);
    }

    #[test]
    fn test_error_serialization() {
        let error = RpcError::method_not_found();
        let json_str = serde_json::to_string(&error).unwrap();
        assert_eq!(json_str, r#"{"code":-32601,"message":"Method not found"}"#);

        let error = RpcError::invalid_params("missing argument 'key'");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(
            value,
            json!({"code": -32602, "message": "Invalid params", "data": "missing argument 'key'"})
        );
    }

    #[test]
    fn test_form_error_object() {
        let formed = RpcError::form(&json!({"code": -32700, "message": "Parse error"})).unwrap();
        assert_eq!(formed, RpcError::parse_error());

        // data is optional and carried verbatim
        let formed =
            RpcError::form(&json!({"code": -32000, "message": "boom", "data": [1, 2]})).unwrap();
        assert_eq!(formed.data, Some(json!([1, 2])));

        // unknown keys are rejected
        assert!(RpcError::form(&json!({"code": -1, "message": "m", "extra": 0})).is_err());
        // missing mandatory keys are rejected
        assert!(RpcError::form(&json!({"message": "m"})).is_err());
        // wrong types are rejected
        assert!(RpcError::form(&json!({"code": "nope", "message": "m"})).is_err());
        assert!(RpcError::form(&json!("not an object")).is_err());
    }
}

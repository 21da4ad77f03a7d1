//! A JSON-RPC 2.0 math service.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::protocol::jsonrpc::{MethodError, MethodTable, ParamSpec, Service};

const PAIR: ParamSpec = ParamSpec::required(&["a", "b"]);

fn binary(
    a: &Value,
    b: &Value,
    ints: impl Fn(i64, i64) -> i64,
    floats: impl Fn(f64, f64) -> f64,
) -> Result<Value, MethodError> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Ok(json!(ints(a, b)));
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => Ok(json!(floats(a, b))),
        _ => Err(MethodError::failed(format!(
            "unsupported operand types: {a} and {b}"
        ))),
    }
}

/// Creates the math service with `add`, `subtract`, `min` and `max`.
pub fn service() -> Service {
    let mut table = MethodTable::new();
    table.sync("add", PAIR, |args| {
        binary(&args[0], &args[1], |a, b| a + b, |a, b| a + b)
    });
    table.sync("subtract", PAIR, |args| {
        binary(&args[0], &args[1], |a, b| a - b, |a, b| a - b)
    });
    table.sync("min", PAIR, |args| {
        binary(&args[0], &args[1], i64::min, f64::min)
    });
    table.sync("max", PAIR, |args| {
        binary(&args[0], &args[1], i64::max, f64::max)
    });
    Service::new(Arc::new(table))
}

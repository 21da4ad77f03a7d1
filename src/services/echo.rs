//! A JSON-RPC 2.0 echo service.
//!
//! Accepts a call using any method name and echoes the request params back:
//! named params as an object, positional params as an array, absent params as
//! an empty array.

use std::sync::Arc;

use serde_json::Value;

use crate::protocol::jsonrpc::{Methods, Params, Service, SyncHandler};

struct Echo;

impl Methods for Echo {
    fn resolve_sync(&self, _method: &str) -> Option<SyncHandler> {
        Some(Arc::new(|params| {
            Ok(match params {
                None => Value::Array(Vec::new()),
                Some(Params::List(items)) => Value::Array(items.clone()),
                Some(Params::Map(map)) if map.is_empty() => Value::Array(Vec::new()),
                Some(Params::Map(map)) => Value::Object(map.clone()),
            })
        }))
    }
}

/// Creates the echo service.
pub fn service() -> Service {
    Service::new(Arc::new(Echo))
}

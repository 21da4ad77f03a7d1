//! Built-in services: echo, math, the asynchronous key/value store, and the
//! data-tree façade over the in-memory store.

pub mod echo;
pub mod keyval;
pub mod math;

use std::sync::Arc;

use crate::protocol::jsonrpc::Service;
use crate::store::{DataService, MemoryStore};

/// Creates the data-tree service over a fresh in-memory store.
pub fn data() -> Service {
    DataService::new(Arc::new(MemoryStore::new())).into_service()
}

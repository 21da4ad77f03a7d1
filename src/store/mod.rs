//! Data-tree transactions over a backing store.
//!
//! A service exposing the tree RPC surface buffers `put`/`merge`/`delete`
//! operations per transaction and applies each buffer as one unit through a
//! [`DataStore`]. Path-rewrite handlers attached to the service's path map
//! translate client paths into backing-store paths on every operation.

pub mod memory;
pub mod service;
pub mod transaction;

pub use memory::MemoryStore;
pub use service::{DataService, RewriteHandler};
pub use transaction::{Change, OpKind, Operation, Transaction};

/// A backing store applying operation batches and serving reads.
pub trait DataStore: Send + Sync {
    /// Applies `ops` as one unit. Returns false when the store rejects the
    /// batch; a rejected batch must leave the store unchanged.
    fn apply(&self, ops: &[Operation]) -> bool;

    /// The value at `path`, if any.
    fn read(&self, path: &serde_json::Value) -> Option<serde_json::Value>;

    /// Whether a value exists at `path`.
    fn exists(&self, path: &serde_json::Value) -> bool {
        self.read(path).is_some()
    }
}

//! The per-transaction operation buffer and its commit rule.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DataStore;

/// The kind of a buffered operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Create a new data element; fails if the target already exists.
    Create,

    /// Set a value in an existing element.
    Set,

    /// Invoke an action (RPC) at the target.
    Action,

    /// Delete the target.
    Delete,
}

/// The path and payload an operation applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Rewritten (backing-store) path of the target.
    pub path: Value,

    /// Payload for create/set/action; absent for delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// One buffered operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// What to do.
    pub operation: OpKind,

    /// Where and with what.
    pub change: Change,
}

/// An ordered buffer of operations applied as one unit on commit.
#[derive(Debug, Default)]
pub struct Transaction {
    ops: Vec<Operation>,
}

impl Transaction {
    /// Creates an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffered operations, in order.
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Buffers a create of `data` at `path`.
    pub fn put(&mut self, path: Value, data: Value) {
        self.ops.push(Operation {
            operation: OpKind::Create,
            change: Change {
                path,
                data: Some(data),
            },
        });
    }

    /// Buffers a set of `data` at `path`. An empty payload is a no-op.
    pub fn merge(&mut self, path: Value, data: Value) {
        if data.as_object().is_some_and(|map| map.is_empty()) {
            return;
        }
        self.ops.push(Operation {
            operation: OpKind::Set,
            change: Change {
                path,
                data: Some(data),
            },
        });
    }

    /// Buffers an action invocation with `input` at `path`.
    pub fn action(&mut self, path: Value, input: Value) {
        self.ops.push(Operation {
            operation: OpKind::Action,
            change: Change {
                path,
                data: Some(input),
            },
        });
    }

    /// Buffers a delete of `path`.
    pub fn delete(&mut self, path: Value) {
        self.ops.push(Operation {
            operation: OpKind::Delete,
            change: Change { path, data: None },
        });
    }

    /// Applies the buffer as one unit through `store`.
    ///
    /// If the store rejects the buffer, every `create` is downgraded to `set`
    /// and the buffer is applied once more. The create/set distinction is not
    /// consistently enforceable against stores that do not separate the two,
    /// and clients read-check existence first, so the downgrade cannot lose
    /// an update. Beyond the one retry the commit fails and the buffer is
    /// left as is (downgrades included) until the transaction is cancelled.
    pub fn commit(&mut self, store: &dyn DataStore) -> bool {
        if self.ops.is_empty() {
            return true;
        }
        if store.apply(&self.ops) {
            return true;
        }
        for op in &mut self.ops {
            if op.operation == OpKind::Create {
                op.operation = OpKind::Set;
            }
        }
        store.apply(&self.ops)
    }
}

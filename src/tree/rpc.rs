//! Method interfaces for JSON-RPC 2.0 data tree services.
//!
//! [`DataRead`] and [`DataWrite`] name the read and write halves of the tree
//! RPC surface; [`register_read`] and [`register_write`] install them into a
//! method table with their parameter schemas, so any backend exposing the
//! surface registers the same method names the same way.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::protocol::jsonrpc::{MethodError, MethodTable, ParamSpec};

/// The read half of the data tree RPC surface.
pub trait DataRead: Send + Sync {
    /// Whether a value exists at `path`.
    fn exists(&self, store: &Value, entity: &Value, path: &Value) -> Result<bool, MethodError>;

    /// The value at `path`, or `null` when absent.
    fn read(&self, store: &Value, entity: &Value, path: &Value) -> Result<Value, MethodError>;
}

/// The write half of the data tree RPC surface.
pub trait DataWrite: Send + Sync {
    /// Allocates a fresh transaction identifier.
    fn txid(&self) -> Result<String, MethodError>;

    /// Buffers a create of `data` at `path` in transaction `txid`.
    fn put(
        &self,
        txid: &str,
        store: &Value,
        entity: &Value,
        path: &Value,
        data: &Value,
    ) -> Result<(), MethodError>;

    /// Buffers a set of `data` at `path` in transaction `txid`.
    fn merge(
        &self,
        txid: &str,
        store: &Value,
        entity: &Value,
        path: &Value,
        data: &Value,
    ) -> Result<(), MethodError>;

    /// Buffers a delete of `path` in transaction `txid`.
    fn delete(
        &self,
        txid: &str,
        store: &Value,
        entity: &Value,
        path: &Value,
    ) -> Result<(), MethodError>;

    /// Applies the transaction's buffer as one unit; false when the backing
    /// store rejected it.
    fn commit(&self, txid: &str) -> Result<bool, MethodError>;

    /// Drops the transaction.
    fn cancel(&self, txid: &str) -> Result<bool, MethodError>;

    /// Extended error information for a failed transaction.
    fn error(&self, txid: &str) -> Result<Value, MethodError>;
}

const READ: ParamSpec = ParamSpec::required(&["store", "entity", "path"]);
const WRITE: ParamSpec = ParamSpec::required(&["txid", "store", "entity", "path", "data"]);
const DROP: ParamSpec = ParamSpec::required(&["txid", "store", "entity", "path"]);
const TX: ParamSpec = ParamSpec::required(&["txid"]);

fn txid_of(value: &Value) -> Result<&str, MethodError> {
    value
        .as_str()
        .ok_or_else(|| MethodError::InvalidParams("txid must be a string".to_string()))
}

/// Registers the [`DataRead`] methods on `table`.
pub fn register_read(table: &mut MethodTable, service: Arc<dyn DataRead>) {
    let reader = Arc::clone(&service);
    table.sync("read", READ, move |args| {
        reader.read(&args[0], &args[1], &args[2])
    });
    table.sync("exists", READ, move |args| {
        service.exists(&args[0], &args[1], &args[2]).map(|b| json!(b))
    });
}

/// Registers the [`DataWrite`] methods on `table`.
pub fn register_write(table: &mut MethodTable, service: Arc<dyn DataWrite>) {
    let writer = Arc::clone(&service);
    table.sync("txid", ParamSpec::none(), move |_| {
        writer.txid().map(|txid| json!(txid))
    });

    let writer = Arc::clone(&service);
    table.sync("put", WRITE, move |args| {
        writer
            .put(txid_of(&args[0])?, &args[1], &args[2], &args[3], &args[4])
            .map(|()| Value::Null)
    });

    let writer = Arc::clone(&service);
    table.sync("merge", WRITE, move |args| {
        writer
            .merge(txid_of(&args[0])?, &args[1], &args[2], &args[3], &args[4])
            .map(|()| Value::Null)
    });

    let writer = Arc::clone(&service);
    table.sync("delete", DROP, move |args| {
        writer
            .delete(txid_of(&args[0])?, &args[1], &args[2], &args[3])
            .map(|()| Value::Null)
    });

    let writer = Arc::clone(&service);
    table.sync("commit", TX, move |args| {
        writer.commit(txid_of(&args[0])?).map(|b| json!(b))
    });

    let writer = Arc::clone(&service);
    table.sync("cancel", TX, move |args| {
        writer.cancel(txid_of(&args[0])?).map(|b| json!(b))
    });

    table.sync("error", TX, move |args| service.error(txid_of(&args[0])?));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::jsonrpc::Methods;

    struct Unimplemented;

    impl DataRead for Unimplemented {
        fn exists(&self, _: &Value, _: &Value, _: &Value) -> Result<bool, MethodError> {
            Err(MethodError::Unsupported)
        }
        fn read(&self, _: &Value, _: &Value, _: &Value) -> Result<Value, MethodError> {
            Err(MethodError::Unsupported)
        }
    }

    impl DataWrite for Unimplemented {
        fn txid(&self) -> Result<String, MethodError> {
            Err(MethodError::Unsupported)
        }
        fn put(
            &self,
            _: &str,
            _: &Value,
            _: &Value,
            _: &Value,
            _: &Value,
        ) -> Result<(), MethodError> {
            Err(MethodError::Unsupported)
        }
        fn merge(
            &self,
            _: &str,
            _: &Value,
            _: &Value,
            _: &Value,
            _: &Value,
        ) -> Result<(), MethodError> {
            Err(MethodError::Unsupported)
        }
        fn delete(&self, _: &str, _: &Value, _: &Value, _: &Value) -> Result<(), MethodError> {
            Err(MethodError::Unsupported)
        }
        fn commit(&self, _: &str) -> Result<bool, MethodError> {
            Err(MethodError::Unsupported)
        }
        fn cancel(&self, _: &str) -> Result<bool, MethodError> {
            Err(MethodError::Unsupported)
        }
        fn error(&self, _: &str) -> Result<Value, MethodError> {
            Err(MethodError::Unsupported)
        }
    }

    #[test]
    fn test_expected_methods_registered() {
        let mut table = MethodTable::new();
        register_read(&mut table, Arc::new(Unimplemented));
        register_write(&mut table, Arc::new(Unimplemented));
        for method in [
            "read", "exists", "txid", "put", "merge", "delete", "commit", "cancel", "error",
        ] {
            assert!(table.resolve_sync(method).is_some(), "missing {method}");
        }
        assert!(table.resolve_sync("subscribe").is_none());
    }

    #[test]
    fn test_abstract_methods_report_unsupported() {
        let mut table = MethodTable::new();
        register_write(&mut table, Arc::new(Unimplemented));
        let handler = table.resolve_sync("txid").unwrap();
        let err = handler(None).unwrap_err();
        assert!(matches!(err, MethodError::Unsupported));
    }
}

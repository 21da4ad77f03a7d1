//! The data-tree transaction façade service.
//!
//! [`DataService`] exposes the tree RPC surface over a [`DataStore`]. Every
//! operation resolves a [`RewriteHandler`] through the service's path map
//! (the handler registered for the nearest governing subtree) and buffers the
//! rewritten path into the named transaction.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::{DataStore, Transaction};
use crate::protocol::jsonrpc::{MethodError, MethodTable, Service};
use crate::tree::rpc::{register_read, register_write, DataRead, DataWrite};
use crate::tree::{PathError, PathMap};

/// A path rewrite attached to a subtree: strip one nested prefix, add
/// another.
///
/// Rewriting is structural on container keys only; it does not descend into
/// list elements.
#[derive(Debug, Clone, Default)]
pub struct RewriteHandler {
    strip: Option<Value>,
    add: Option<Value>,
}

impl RewriteHandler {
    /// A handler leaving paths untouched.
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// A handler replacing the `strip` prefix with the `add` prefix.
    pub fn remap(strip: Value, add: Value) -> Self {
        Self {
            strip: Some(strip),
            add: Some(add),
        }
    }

    /// Rewrites `path` for the backing store.
    pub fn rewrite(&self, path: &Value) -> Value {
        let mut stripped = path;
        if let Some(strip) = &self.strip {
            let mut walk = strip;
            while let Some((key, next)) = walk.as_object().and_then(|map| map.iter().next()) {
                match stripped.get(key.as_str()) {
                    Some(inner) => stripped = inner,
                    None => break,
                }
                walk = next;
            }
        }
        match &self.add {
            None => stripped.clone(),
            Some(add) => wrap(add, stripped),
        }
    }
}

/// Rebuilds the container levels of `add` around `inner`.
fn wrap(add: &Value, inner: &Value) -> Value {
    match add.as_object().and_then(|map| map.iter().next()) {
        None => inner.clone(),
        Some((key, next)) => {
            let mut map = Map::new();
            map.insert(key.clone(), wrap(next, inner));
            Value::Object(map)
        }
    }
}

/// A data-tree service: transactions, path rewriting, and a backing store.
pub struct DataService {
    pathmap: PathMap<Arc<RewriteHandler>>,
    default_handler: Arc<RewriteHandler>,
    transactions: DashMap<String, Transaction>,
    store: Arc<dyn DataStore>,
}

impl DataService {
    /// Creates a façade over `store` with a passthrough handler governing the
    /// whole tree.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        let default_handler = Arc::new(RewriteHandler::passthrough());
        let mut pathmap = PathMap::new();
        pathmap
            .set_metadata(&Value::Object(Map::new()), Arc::clone(&default_handler))
            .expect("the path map root is always a container");
        Self {
            pathmap,
            default_handler,
            transactions: DashMap::new(),
            store,
        }
    }

    /// Registers a prefix remap: operations under the `from` subtree are
    /// rewritten to the `to` prefix before they reach the store.
    pub fn with_remap(mut self, from: Value, to: Value) -> Result<Self, PathError> {
        let handler = Arc::new(RewriteHandler::remap(from.clone(), to));
        self.pathmap.set_metadata(&from, handler)?;
        Ok(self)
    }

    /// The handler governing `path`.
    fn handler(&self, path: &Value) -> Arc<RewriteHandler> {
        self.pathmap
            .metadata(path)
            .unwrap_or_else(|| Arc::clone(&self.default_handler))
    }

    fn with_transaction<T>(
        &self,
        txid: &str,
        operate: impl FnOnce(&mut Transaction) -> T,
    ) -> Result<T, MethodError> {
        let mut transaction = self
            .transactions
            .get_mut(txid)
            .ok_or_else(|| MethodError::failed(format!("unknown transaction '{txid}'")))?;
        Ok(operate(&mut transaction))
    }

    /// Builds the method table exposing this façade's RPC surface.
    pub fn into_table(self) -> MethodTable {
        let shared = Arc::new(self);
        let mut table = MethodTable::new();
        register_read(&mut table, Arc::clone(&shared) as Arc<dyn DataRead>);
        register_write(&mut table, shared as Arc<dyn DataWrite>);
        table
    }

    /// Builds a dispatchable service for this façade.
    pub fn into_service(self) -> Service {
        Service::new(Arc::new(self.into_table()))
    }
}

impl DataRead for DataService {
    fn exists(&self, _store: &Value, _entity: &Value, path: &Value) -> Result<bool, MethodError> {
        // store and entity are accepted but not yet interpreted
        let path = self.handler(path).rewrite(path);
        Ok(self.store.exists(&path))
    }

    fn read(&self, _store: &Value, _entity: &Value, path: &Value) -> Result<Value, MethodError> {
        let path = self.handler(path).rewrite(path);
        Ok(self.store.read(&path).unwrap_or(Value::Null))
    }
}

impl DataWrite for DataService {
    fn txid(&self) -> Result<String, MethodError> {
        // generation re-rolls on the (unlikely) collision
        loop {
            let txid = Uuid::new_v4().to_string();
            if !self.transactions.contains_key(&txid) {
                debug!(txid = %txid, "opened transaction");
                self.transactions.insert(txid.clone(), Transaction::new());
                return Ok(txid);
            }
        }
    }

    fn put(
        &self,
        txid: &str,
        _store: &Value,
        _entity: &Value,
        path: &Value,
        data: &Value,
    ) -> Result<(), MethodError> {
        let rewritten = self.handler(path).rewrite(path);
        self.with_transaction(txid, |tx| tx.put(rewritten, data.clone()))
    }

    fn merge(
        &self,
        txid: &str,
        _store: &Value,
        _entity: &Value,
        path: &Value,
        data: &Value,
    ) -> Result<(), MethodError> {
        let rewritten = self.handler(path).rewrite(path);
        self.with_transaction(txid, |tx| tx.merge(rewritten, data.clone()))
    }

    fn delete(
        &self,
        txid: &str,
        _store: &Value,
        _entity: &Value,
        path: &Value,
    ) -> Result<(), MethodError> {
        let rewritten = self.handler(path).rewrite(path);
        self.with_transaction(txid, |tx| tx.delete(rewritten))
    }

    fn commit(&self, txid: &str) -> Result<bool, MethodError> {
        let committed = self.with_transaction(txid, |tx| tx.commit(self.store.as_ref()))?;
        if committed {
            self.transactions.remove(txid);
        } else {
            debug!(txid = %txid, "commit failed; transaction kept until cancel");
        }
        Ok(committed)
    }

    fn cancel(&self, txid: &str) -> Result<bool, MethodError> {
        self.transactions
            .remove(txid)
            .map(|_| true)
            .ok_or_else(|| MethodError::failed(format!("unknown transaction '{txid}'")))
    }

    fn error(&self, _txid: &str) -> Result<Value, MethodError> {
        // Extended error reporting is not implemented here.
        Err(MethodError::Unsupported)
    }
}

// Copyright (c) 2025 Banyan RPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Method tables and parameter binding.
//!
//! Every method declares an ordered parameter schema; the table binds the
//! request params against it once, before the implementation runs, so that
//! dispatch failures (arity or name mismatches) are cleanly separated from
//! runtime failures.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::service::CallHandle;
use super::types::Params;

/// Failure surfaced by a method implementation or its parameter binding.
#[derive(Debug, Error)]
pub enum MethodError {
    /// Arity or name mismatch between the request params and the method's
    /// declared schema. The detail string is copied into the error `data`.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The method exists on the service surface but has no implementation
    /// here.
    #[error("method not supported in this service")]
    Unsupported,

    /// Any other implementation failure, described for the error message.
    #[error("{0}")]
    Failed(String),
}

impl MethodError {
    /// Wraps an arbitrary failure as [`MethodError::Failed`].
    pub fn failed(detail: impl std::fmt::Display) -> Self {
        MethodError::Failed(detail.to_string())
    }
}

/// Declared parameter schema: ordered names of which the first `required`
/// are mandatory. Optional parameters bind to `null` when absent.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    names: &'static [&'static str],
    required: usize,
}

impl ParamSpec {
    /// A schema with `required` mandatory leading parameters.
    pub const fn new(names: &'static [&'static str], required: usize) -> Self {
        assert!(required <= names.len());
        Self { names, required }
    }

    /// A schema where every parameter is mandatory.
    pub const fn required(names: &'static [&'static str]) -> Self {
        Self::new(names, names.len())
    }

    /// A schema taking no parameters.
    pub const fn none() -> Self {
        Self::new(&[], 0)
    }

    /// Binds request params to an argument vector in schema order.
    ///
    /// Positional params bind by position, named params bind by name; absent
    /// params bind as an empty positional list. Any mismatch fails with
    /// [`MethodError::InvalidParams`] carrying the detail.
    pub fn bind(&self, params: Option<&Params>) -> Result<Vec<Value>, MethodError> {
        match params {
            None => self.bind_positional(&[]),
            Some(Params::List(items)) => self.bind_positional(items),
            Some(Params::Map(map)) => {
                for key in map.keys() {
                    if !self.names.contains(&key.as_str()) {
                        return Err(MethodError::InvalidParams(format!(
                            "unexpected argument '{key}'"
                        )));
                    }
                }
                let mut bound = Vec::with_capacity(self.names.len());
                for (position, name) in self.names.iter().enumerate() {
                    match map.get(*name) {
                        Some(value) => bound.push(value.clone()),
                        None if position < self.required => {
                            return Err(MethodError::InvalidParams(format!(
                                "missing argument '{name}'"
                            )));
                        }
                        None => bound.push(Value::Null),
                    }
                }
                Ok(bound)
            }
        }
    }

    fn bind_positional(&self, items: &[Value]) -> Result<Vec<Value>, MethodError> {
        if items.len() < self.required || items.len() > self.names.len() {
            return Err(MethodError::InvalidParams(format!(
                "expects {} argument(s), got {}",
                self.describe_arity(),
                items.len()
            )));
        }
        let mut bound = items.to_vec();
        bound.resize(self.names.len(), Value::Null);
        Ok(bound)
    }

    fn describe_arity(&self) -> String {
        if self.required == self.names.len() {
            self.required.to_string()
        } else {
            format!("{} to {}", self.required, self.names.len())
        }
    }
}

/// A synchronous method implementation, binding included.
pub type SyncHandler = Arc<dyn Fn(Option<&Params>) -> Result<Value, MethodError> + Send + Sync>;

/// An asynchronous method implementation, binding included. The first
/// argument is the call handle through which the implementation reports its
/// result or error, immediately or later.
pub type AsyncHandler =
    Arc<dyn Fn(CallHandle, Option<&Params>) -> Result<(), MethodError> + Send + Sync>;

/// The capability set the dispatcher is polymorphic over: resolve a method
/// name to a synchronous or asynchronous implementation.
pub trait Methods: Send + Sync {
    /// Returns the synchronous implementation of `method`, if any.
    fn resolve_sync(&self, method: &str) -> Option<SyncHandler>;

    /// Returns the asynchronous implementation of `method`, if any.
    fn resolve_async(&self, method: &str) -> Option<AsyncHandler> {
        let _ = method;
        None
    }
}

/// A name-to-implementation registry with schema-checked binding.
///
/// Registration wraps each implementation so that the schema is enforced
/// before the implementation body runs.
#[derive(Default)]
pub struct MethodTable {
    sync: HashMap<String, SyncHandler>,
    asynchronous: HashMap<String, AsyncHandler>,
}

impl MethodTable {
    /// Creates an empty method table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a synchronous method under `name` with parameter schema
    /// `spec`. The implementation receives arguments bound in schema order.
    pub fn sync<F>(&mut self, name: &str, spec: ParamSpec, implementation: F)
    where
        F: Fn(&[Value]) -> Result<Value, MethodError> + Send + Sync + 'static,
    {
        let handler: SyncHandler = Arc::new(move |params| {
            let arguments = spec.bind(params)?;
            implementation(&arguments)
        });
        self.sync.insert(name.to_string(), handler);
    }

    /// Registers an asynchronous method under `name` with parameter schema
    /// `spec`.
    pub fn asynchronous<F>(&mut self, name: &str, spec: ParamSpec, implementation: F)
    where
        F: Fn(CallHandle, &[Value]) -> Result<(), MethodError> + Send + Sync + 'static,
    {
        let handler: AsyncHandler = Arc::new(move |call, params| {
            let arguments = spec.bind(params)?;
            implementation(call, &arguments)
        });
        self.asynchronous.insert(name.to_string(), handler);
    }
}

impl Methods for MethodTable {
    fn resolve_sync(&self, method: &str) -> Option<SyncHandler> {
        self.sync.get(method).cloned()
    }

    fn resolve_async(&self, method: &str) -> Option<AsyncHandler> {
        self.asynchronous.get(method).cloned()
    }
}

//! An in-memory backing store over a plain JSON tree.
//!
//! Batches apply atomically: operations run against a working copy that only
//! replaces the state when every operation succeeds. A `create` whose target
//! already holds a value rejects the batch; the transaction layer then
//! retries with creates downgraded to sets. Reads evaluate the path through
//! the selector.

use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::{DataStore, OpKind, Operation};
use crate::tree::Selector;

/// In-memory [`DataStore`] holding one JSON tree.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Value>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Value::Object(Map::new())),
        }
    }

    /// Creates a store seeded with `state`.
    pub fn with_state(state: Value) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// A copy of the current state tree.
    pub fn snapshot(&self) -> Value {
        self.state.lock().clone()
    }
}

impl DataStore for MemoryStore {
    fn apply(&self, ops: &[Operation]) -> bool {
        let mut state = self.state.lock();
        let mut next = state.clone();
        for op in ops {
            let data = op.change.data.as_ref().unwrap_or(&Value::Null);
            let applied = match op.operation {
                OpKind::Create => write(&mut next, &op.change.path, data, true),
                OpKind::Set => write(&mut next, &op.change.path, data, false),
                OpKind::Delete => remove(&mut next, &op.change.path),
                // Actions carry no state; the batch accepts them.
                OpKind::Action => true,
            };
            if !applied {
                return false;
            }
        }
        *state = next;
        true
    }

    fn read(&self, path: &Value) -> Option<Value> {
        let selector = Selector::path(path, false).ok()?;
        let state = self.state.lock();
        selector.select(&state)
    }
}

/// Splits a list path item into atomic match pairs and the structured descent
/// pair.
fn split_item(spec: &Map<String, Value>) -> (Map<String, Value>, Option<(&String, &Value)>) {
    let mut matches = Map::new();
    let mut descent = None;
    for (key, value) in spec {
        if value.is_object() || value.is_array() {
            descent = Some((key, value));
        } else {
            matches.insert(key.clone(), value.clone());
        }
    }
    (matches, descent)
}

fn item_matches(item: &Value, matches: &Map<String, Value>) -> bool {
    matches
        .iter()
        .all(|(key, value)| item.get(key) == Some(value))
}

/// An empty object or array marks the end of a path.
fn is_terminal(path: &Value) -> bool {
    match path {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Writes `data` at `path` inside `value`, scaffolding intermediate
/// containers and list elements. With `create_only`, an already-set target
/// fails the write.
fn write(value: &mut Value, path: &Value, data: &Value, create_only: bool) -> bool {
    match path {
        Value::Object(map) => {
            let Some((key, next)) = map.iter().next() else {
                return place(value, data, create_only);
            };
            if value.is_null() {
                *value = Value::Object(Map::new());
            }
            let Some(target) = value.as_object_mut() else {
                return false;
            };
            let slot = target.entry(key.clone()).or_insert(Value::Null);
            write(slot, next, data, create_only)
        }
        Value::Array(items) => {
            let Some(spec) = items.first().and_then(Value::as_object) else {
                return place(value, data, create_only);
            };
            let (matches, descent) = split_item(spec);
            if matches.is_empty() {
                return place(value, data, create_only);
            }
            if value.is_null() {
                *value = Value::Array(Vec::new());
            }
            let Some(target) = value.as_array_mut() else {
                return false;
            };
            let (position, fresh) = match target.iter().position(|item| item_matches(item, &matches))
            {
                Some(position) => (position, false),
                None => {
                    target.push(Value::Object(matches.clone()));
                    (target.len() - 1, true)
                }
            };
            let element = &mut target[position];
            match descent {
                // A freshly scaffolded element is the creation itself.
                None => place(element, data, create_only && !fresh),
                Some((key, next)) => {
                    let Some(fields) = element.as_object_mut() else {
                        return false;
                    };
                    let slot = fields.entry(key.clone()).or_insert(Value::Null);
                    write(slot, next, data, create_only)
                }
            }
        }
        _ => false,
    }
}

fn place(slot: &mut Value, data: &Value, create_only: bool) -> bool {
    if slot.is_null() {
        *slot = data.clone();
        return true;
    }
    if create_only {
        return false;
    }
    if let (Some(target), Some(patch)) = (slot.as_object_mut(), data.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
        return true;
    }
    *slot = data.clone();
    true
}

/// Removes the target of `path` from `value`. Removing something that is not
/// there is a no-op: a delete could never succeed on the downgrade retry, and
/// clients read-check first.
fn remove(value: &mut Value, path: &Value) -> bool {
    match path {
        Value::Object(map) => {
            let Some((key, next)) = map.iter().next() else {
                return true;
            };
            let Some(target) = value.as_object_mut() else {
                return true;
            };
            if is_terminal(next) {
                target.remove(key.as_str());
                return true;
            }
            match target.get_mut(key.as_str()) {
                Some(child) => remove(child, next),
                None => true,
            }
        }
        Value::Array(items) => {
            let Some(spec) = items.first().and_then(Value::as_object) else {
                return true;
            };
            let (matches, descent) = split_item(spec);
            if matches.is_empty() {
                return true;
            }
            let Some(target) = value.as_array_mut() else {
                return true;
            };
            match descent {
                None => {
                    target.retain(|item| !item_matches(item, &matches));
                    true
                }
                Some((key, next)) => {
                    let Some(element) =
                        target.iter_mut().find(|item| item_matches(item, &matches))
                    else {
                        return true;
                    };
                    let Some(fields) = element.as_object_mut() else {
                        return true;
                    };
                    if is_terminal(next) {
                        fields.remove(key.as_str());
                        return true;
                    }
                    match fields.get_mut(key.as_str()) {
                        Some(child) => remove(child, next),
                        None => true,
                    }
                }
            }
        }
        _ => true,
    }
}

//! Select data from a data tree.
//!
//! A selector, compiled once from a path expression, picks a sub-value out of
//! a context value. The path is a nested literal shaped like the data:
//!
//! * an empty object or empty array selects the current context value;
//! * a non-empty object whose pair values are all atomic (a *match*) selects
//!   the context iff it is a mapping with an equal value for every match pair;
//! * a non-empty object with one structured pair value descends into that
//!   pair (after checking any match pairs) and returns the descent's
//!   selection directly;
//! * a non-empty object with several structured pair values collects the
//!   non-null descents into a mapping keyed by the pair keys;
//! * a non-empty array with one structured item descends into the first
//!   context item the item selector accepts and returns its selection
//!   directly;
//! * a non-empty array with several items collects every non-null selection
//!   of every item selector over every context item.
//!
//! Selection is pure: the same path and data always select the same value.

use serde_json::{Map, Value};
use thiserror::Error;

/// A path expression failed to compile to a selector.
#[derive(Debug, Error)]
#[error("bad path: {0}")]
pub struct SelectError(Value);

/// A compiled selector.
pub enum Selector {
    /// Selects the context value itself.
    Context,

    /// Matches and descends into a mapping context.
    Dict {
        /// Atomic pairs the context must carry verbatim.
        matches: Map<String, Value>,
        /// Structured pairs to descend into, keyed by pair key.
        selects: Vec<(String, Selector)>,
    },

    /// Descends into the items of a sequence context.
    List(Vec<Selector>),
}

impl Selector {
    /// Compiles a selector from `path`.
    ///
    /// With `odl_kludge` set, the path is assumed to have been formed by an
    /// ODL controller and known errors in path formation are corrected:
    /// module prefixes (`modname:`) are stripped from pair keys, and the
    /// superfluous object wrapper some paths put around a list selector
    /// (repeating the identifier) is removed.
    pub fn path(path: &Value, odl_kludge: bool) -> Result<Self, SelectError> {
        match path {
            Value::Object(map) => {
                if map.is_empty() {
                    return Ok(Selector::Context);
                }
                let mut matches = Map::new();
                let mut selects = Vec::new();
                for (key, value) in map {
                    let key = if odl_kludge {
                        key.split_once(':').map_or(key.as_str(), |(_, rest)| rest)
                    } else {
                        key.as_str()
                    };
                    let mut value = value;
                    if odl_kludge {
                        // ODL sometimes wraps a list selector in an object
                        // repeating the same identifier; unwrap that level.
                        if let Some(inner) = value.get(key) {
                            if inner.is_array() {
                                value = inner;
                            }
                        }
                    }
                    match Selector::path(value, odl_kludge) {
                        Ok(selector) => selects.push((key.to_string(), selector)),
                        Err(_) => {
                            matches.insert(key.to_string(), value.clone());
                        }
                    }
                }
                Ok(Selector::Dict { matches, selects })
            }
            Value::Array(items) => {
                if items.is_empty() {
                    return Ok(Selector::Context);
                }
                let selects = items
                    .iter()
                    .map(|item| Selector::path(item, odl_kludge))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Selector::List(selects))
            }
            other => Err(SelectError(other.clone())),
        }
    }

    /// Returns the value this selector selects from the context `data`, or
    /// `None` when nothing can be selected.
    pub fn select(&self, data: &Value) -> Option<Value> {
        match self {
            Selector::Context => Some(data.clone()),
            Selector::Dict { matches, selects } => {
                let context = data.as_object()?;
                for (key, expected) in matches {
                    if context.get(key) != Some(expected) {
                        return None;
                    }
                }
                if selects.is_empty() {
                    return Some(data.clone());
                }
                let mut selected = Map::new();
                for (key, selector) in selects {
                    let value = context.get(key).and_then(|value| selector.select(value));
                    if selects.len() == 1 {
                        return value;
                    }
                    if let Some(value) = value {
                        selected.insert(key.clone(), value);
                    }
                }
                (!selected.is_empty()).then_some(Value::Object(selected))
            }
            Selector::List(selects) => {
                let items = data.as_array()?;
                let mut selected = Vec::new();
                for selector in selects {
                    for item in items {
                        let Some(value) = selector.select(item) else {
                            continue;
                        };
                        if selects.len() == 1 {
                            return Some(value);
                        }
                        selected.push(value);
                    }
                }
                (!selected.is_empty()).then_some(Value::Array(selected))
            }
        }
    }
}

//! Hierarchical path map over YANG-shaped trees.
//!
//! Paths are expressed as nested literals: `{"level1": {"level2": {}}}` walks
//! containers (`{}` signifies the end), `{"list": [{"key": "k1"}]}` walks into
//! a keyed list element. Each container and list node carries two slots:
//! `meta`, intended for schema-level handler objects, and `data`, used when
//! the tree serves as a temporary scratchpad during data operations. An
//! optional validator forms values on `data` assignment.
//!
//! Metadata lookups honor inheritance: a query below the deepest materialized
//! node answers with the nearest ancestor metadata, so a handler registered at
//! the root is the fallback for the whole tree.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

/// Failures raised by path map operations.
#[derive(Debug, Error)]
pub enum PathError {
    /// A list element with the same composite key already exists.
    #[error("duplicate key")]
    DuplicateKey,

    /// An element is missing one of the list's configured key fields.
    #[error("missing key field '{0}'")]
    MissingKeyField(String),

    /// The path literal does not match the shape of the tree at this point.
    #[error("path does not match tree shape at '{0}'")]
    Mismatch(String),

    /// A leaf value has no metadata or data slots.
    #[error("leaf values carry no slots")]
    LeafSlots,

    /// A data validator rejected the assigned value.
    #[error("invalid data: {0}")]
    Validation(String),
}

/// Validator applied to values on `data` assignment; returns the formed value.
pub type DataValidator = Arc<dyn Fn(&Value) -> Result<Value, PathError> + Send + Sync>;

/// The meta/data/validator slots carried by container and list nodes.
pub struct Slots<M> {
    meta: Option<M>,
    data: Option<Value>,
    validator: Option<DataValidator>,
}

impl<M> Default for Slots<M> {
    fn default() -> Self {
        Self {
            meta: None,
            data: None,
            validator: None,
        }
    }
}

/// A container node: an ordered mapping from key to child node.
pub struct Container<M> {
    children: BTreeMap<String, Node<M>>,
    slots: Slots<M>,
}

impl<M> Default for Container<M> {
    fn default() -> Self {
        Self {
            children: BTreeMap::new(),
            slots: Slots::default(),
        }
    }
}

impl<M> Container<M> {
    /// Builds a container subtree from a path/data literal: nested objects
    /// become containers, arrays become lists, anything else a leaf.
    fn from_literal(literal: &Map<String, Value>) -> Self {
        let mut container = Self::default();
        for (key, value) in literal {
            container
                .children
                .insert(key.clone(), Node::from_literal(value));
        }
        container
    }
}

/// A list node: an ordered sequence of container elements with an optional
/// tuple of key fields and a secondary index over them.
///
/// When the key tuple is set, every element is indexed and inserting a
/// duplicate composite key fails.
pub struct KeyedList<M> {
    items: Vec<Node<M>>,
    key_fields: Option<Vec<String>>,
    index: HashMap<String, usize>,
    slots: Slots<M>,
}

impl<M> Default for KeyedList<M> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            key_fields: None,
            index: HashMap::new(),
            slots: Slots::default(),
        }
    }
}

impl<M> KeyedList<M> {
    /// Creates an empty, unkeyed list.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_literal(literal: &[Value]) -> Self {
        let mut list = Self::default();
        for item in literal {
            // Empty objects mark path ends, not elements.
            if let Some(map) = item.as_object() {
                if !map.is_empty() {
                    list.items.push(Node::Container(Container::from_literal(map)));
                }
            }
        }
        list
    }

    /// The list elements.
    pub fn items(&self) -> &[Node<M>] {
        &self.items
    }

    /// Configures the key-field tuple after the fact and rebuilds the index.
    pub fn set_key(&mut self, fields: &[&str]) -> Result<(), PathError> {
        let fields: Vec<String> = fields.iter().map(|f| (*f).to_string()).collect();
        let mut index = HashMap::new();
        for (position, item) in self.items.iter().enumerate() {
            let key = element_key(&fields, item)?;
            if index.insert(key, position).is_some() {
                return Err(PathError::DuplicateKey);
            }
        }
        self.key_fields = Some(fields);
        self.index = index;
        Ok(())
    }

    /// Appends an element built from an object literal.
    pub fn push_literal(&mut self, item: &Value) -> Result<(), PathError> {
        let map = item
            .as_object()
            .ok_or_else(|| PathError::Mismatch(item.to_string()))?;
        self.push_node(Node::Container(Container::from_literal(map)))
    }

    /// Appends elements built from object literals.
    pub fn extend<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a Value>,
    ) -> Result<(), PathError> {
        for item in items {
            self.push_literal(item)?;
        }
        Ok(())
    }

    fn push_node(&mut self, node: Node<M>) -> Result<(), PathError> {
        if let Some(fields) = &self.key_fields {
            let key = element_key(fields, &node)?;
            if self.index.contains_key(&key) {
                return Err(PathError::DuplicateKey);
            }
            self.index.insert(key, self.items.len());
        }
        self.items.push(node);
        Ok(())
    }

    /// Looks up the element matched by the pairs of `matches` (an object of
    /// atomic match keys): through the index when the configured key tuple is
    /// covered, by linear scan otherwise.
    pub fn lookup(&self, matches: &Value) -> Option<&Node<M>> {
        let matches = matches.as_object()?;
        self.lookup_index(matches).map(|i| &self.items[i])
    }

    fn lookup_index(&self, matches: &Map<String, Value>) -> Option<usize> {
        if let Some(fields) = &self.key_fields {
            if fields.iter().all(|f| matches.contains_key(f)) {
                let key = query_key(fields, matches)?;
                let position = *self.index.get(&key)?;
                // The index covers the key tuple only; any extra match pairs
                // still have to agree.
                return element_matches(&self.items[position], matches).then_some(position);
            }
        }
        self.items
            .iter()
            .position(|item| element_matches(item, matches))
    }
}

fn element_matches<M>(item: &Node<M>, matches: &Map<String, Value>) -> bool {
    matches
        .iter()
        .all(|(key, value)| item.child_value(key) == Some(value))
}

fn element_key<M>(fields: &[String], item: &Node<M>) -> Result<String, PathError> {
    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        let value = item
            .child_value(field)
            .ok_or_else(|| PathError::MissingKeyField(field.clone()))?;
        parts.push(format!("{field}\u{1e}{value}"));
    }
    Ok(parts.join("\u{1f}"))
}

fn query_key(fields: &[String], matches: &Map<String, Value>) -> Option<String> {
    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        parts.push(format!("{field}\u{1e}{}", matches.get(field)?));
    }
    Some(parts.join("\u{1f}"))
}

/// One node of the path map tree.
pub enum Node<M> {
    /// An ordered mapping from key to child node.
    Container(Container<M>),

    /// An ordered sequence of keyed container elements.
    List(KeyedList<M>),

    /// An atomic value stored as a container's child.
    Leaf(Value),
}

impl<M> Node<M> {
    fn from_literal(value: &Value) -> Self {
        match value {
            Value::Object(map) => Node::Container(Container::from_literal(map)),
            Value::Array(items) => Node::List(KeyedList::from_literal(items)),
            atomic => Node::Leaf(atomic.clone()),
        }
    }

    /// The container child at `key`, if this node is a container.
    pub fn child(&self, key: &str) -> Option<&Node<M>> {
        match self {
            Node::Container(container) => container.children.get(key),
            _ => None,
        }
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut Node<M>> {
        match self {
            Node::Container(container) => container.children.get_mut(key),
            _ => None,
        }
    }

    /// The leaf value of the container child at `key`.
    pub fn child_value(&self, key: &str) -> Option<&Value> {
        match self.child(key)? {
            Node::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// True for a container without children.
    pub fn is_empty_container(&self) -> bool {
        matches!(self, Node::Container(container) if container.children.is_empty())
    }

    /// The list behind this node, if it is one.
    pub fn as_list(&self) -> Option<&KeyedList<M>> {
        match self {
            Node::List(list) => Some(list),
            _ => None,
        }
    }

    /// The list behind this node, for key configuration.
    pub fn as_list_mut(&mut self) -> Option<&mut KeyedList<M>> {
        match self {
            Node::List(list) => Some(list),
            _ => None,
        }
    }

    /// The leaf value, if this node is one.
    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Node::Leaf(value) => Some(value),
            _ => None,
        }
    }

    fn slots(&self) -> Option<&Slots<M>> {
        match self {
            Node::Container(container) => Some(&container.slots),
            Node::List(list) => Some(&list.slots),
            Node::Leaf(_) => None,
        }
    }

    fn slots_mut(&mut self) -> Option<&mut Slots<M>> {
        match self {
            Node::Container(container) => Some(&mut container.slots),
            Node::List(list) => Some(&mut list.slots),
            Node::Leaf(_) => None,
        }
    }

    /// The node's metadata slot.
    pub fn meta(&self) -> Option<&M> {
        self.slots().and_then(|slots| slots.meta.as_ref())
    }

    /// Sets the node's metadata slot.
    pub fn set_meta(&mut self, meta: M) -> Result<(), PathError> {
        self.slots_mut().ok_or(PathError::LeafSlots)?.meta = Some(meta);
        Ok(())
    }

    /// The node's data slot.
    pub fn data(&self) -> Option<&Value> {
        self.slots().and_then(|slots| slots.data.as_ref())
    }

    /// Sets the node's data slot, forming the value through the validator if
    /// one is installed.
    pub fn set_data(&mut self, value: Value) -> Result<(), PathError> {
        let slots = self.slots_mut().ok_or(PathError::LeafSlots)?;
        let value = match &slots.validator {
            Some(validate) => validate(&value)?,
            None => value,
        };
        slots.data = Some(value);
        Ok(())
    }

    /// Installs a validator applied on every later `data` assignment.
    pub fn set_validator(&mut self, validator: DataValidator) -> Result<(), PathError> {
        self.slots_mut().ok_or(PathError::LeafSlots)?.validator = Some(validator);
        Ok(())
    }
}

/// Reads a container path level: its first pair, or nothing at the path end.
fn first_pair(map: &Map<String, Value>) -> Option<(&String, &Value)> {
    map.iter().next()
}

/// Splits a list path item into atomic match pairs and the structured
/// descent pair.
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

fn find<'a, M>(node: &'a Node<M>, path: &Value, inherit: bool) -> Option<&'a Node<M>> {
    let fallback = |found: Option<&'a Node<M>>| match found {
        Some(found) => Some(found),
        None if inherit => Some(node),
        None => None,
    };
    match path {
        Value::Object(map) => {
            let Some((key, next)) = first_pair(map) else {
                return Some(node);
            };
            match node.child(key) {
                Some(child) => fallback(find(child, next, inherit)),
                None => fallback(None),
            }
        }
        Value::Array(items) => {
            let Node::List(list) = node else {
                return fallback(None);
            };
            let Some(spec) = items.first().and_then(Value::as_object) else {
                return Some(node);
            };
            let (matches, descent) = split_item(spec);
            if matches.is_empty() {
                return Some(node);
            }
            let found = list
                .lookup_index(&matches)
                .map(|position| &list.items[position]);
            let result = found.and_then(|element| match descent {
                None => Some(element),
                Some((key, next)) => match element.child(key) {
                    Some(child) => find(child, next, inherit),
                    // Descent key absent from the element: stop at the element.
                    None => Some(element),
                },
            });
            fallback(result)
        }
        _ => fallback(None),
    }
}

fn find_mut<'a, M>(node: &'a mut Node<M>, path: &Value) -> Option<&'a mut Node<M>> {
    match path {
        Value::Object(map) => {
            let Some((key, next)) = first_pair(map) else {
                return Some(node);
            };
            find_mut(node.child_mut(key)?, next)
        }
        Value::Array(items) => {
            let Some(spec) = items.first().and_then(Value::as_object) else {
                return Some(node);
            };
            let (matches, descent) = split_item(spec);
            if matches.is_empty() {
                return Some(node);
            }
            let Node::List(list) = node else {
                return None;
            };
            let position = list.lookup_index(&matches)?;
            let element = &mut list.items[position];
            match descent {
                None => Some(element),
                Some((key, next)) => {
                    if element.child(key).is_some() {
                        find_mut(element.child_mut(key)?, next)
                    } else {
                        // Descent key absent from the element: stop at the element.
                        Some(element)
                    }
                }
            }
        }
        _ => None,
    }
}

fn create_in<'a, M>(node: &'a mut Node<M>, path: &Value) -> Result<&'a mut Node<M>, PathError> {
    match path {
        Value::Object(map) => {
            let Some((key, next)) = first_pair(map) else {
                return Ok(node);
            };
            let Node::Container(container) = node else {
                return Err(PathError::Mismatch(key.clone()));
            };
            let child = match container.children.entry(key.clone()) {
                Entry::Vacant(slot) => slot.insert(Node::from_literal(next)),
                Entry::Occupied(slot) => slot.into_mut(),
            };
            create_in(child, next)
        }
        Value::Array(items) => {
            let Some(spec) = items.first().and_then(Value::as_object) else {
                return Ok(node);
            };
            let (matches, descent) = split_item(spec);
            if matches.is_empty() {
                return Ok(node);
            }
            let Node::List(list) = node else {
                return Err(PathError::Mismatch(path.to_string()));
            };
            let position = match list.lookup_index(&matches) {
                Some(position) => position,
                None => {
                    list.push_node(Node::Container(Container::from_literal(spec)))?;
                    list.items.len() - 1
                }
            };
            let element = &mut list.items[position];
            match descent {
                None => Ok(element),
                Some((key, next)) => {
                    let Node::Container(container) = element else {
                        return Err(PathError::Mismatch(key.clone()));
                    };
                    let child = match container.children.entry(key.clone()) {
                        Entry::Vacant(slot) => slot.insert(Node::from_literal(next)),
                        Entry::Occupied(slot) => slot.into_mut(),
                    };
                    create_in(child, next)
                }
            }
        }
        _ => Ok(node),
    }
}

fn find_meta<'a, M>(node: &'a Node<M>, path: &Value, best: Option<&'a M>) -> Option<&'a M> {
    let best = node.meta().or(best);
    match path {
        Value::Object(map) => {
            let Some((key, next)) = first_pair(map) else {
                return best;
            };
            match node.child(key) {
                Some(child) => find_meta(child, next, best),
                None => best,
            }
        }
        Value::Array(items) => {
            let Node::List(list) = node else {
                return best;
            };
            let Some(spec) = items.first().and_then(Value::as_object) else {
                return best;
            };
            let (matches, descent) = split_item(spec);
            if matches.is_empty() {
                return best;
            }
            match list.lookup_index(&matches).map(|i| &list.items[i]) {
                Some(element) => {
                    let best = element.meta().or(best);
                    match descent {
                        None => best,
                        Some((key, next)) => match element.child(key) {
                            Some(child) => find_meta(child, next, best),
                            None => best,
                        },
                    }
                }
                None => best,
            }
        }
        _ => best,
    }
}

fn project<M>(node: &Node<M>) -> Option<Value> {
    match node {
        Node::Leaf(value) => Some(value.clone()),
        Node::Container(container) => {
            if container.children.is_empty() {
                return container.slots.data.clone();
            }
            let mut map = Map::new();
            for (key, child) in &container.children {
                if let Some(value) = project(child) {
                    let empty = value.as_object().is_some_and(|m| m.is_empty());
                    if !empty {
                        map.insert(key.clone(), value);
                    }
                }
            }
            Some(Value::Object(map))
        }
        Node::List(list) => Some(Value::Array(
            list.items
                .iter()
                .map(|item| project(item).unwrap_or(Value::Null))
                .collect(),
        )),
    }
}

/// A map from hierarchical paths to metadata handlers and scratch data.
///
/// The root is always a container; nodes never reference their parent, so
/// every operation walks from the root with a path expression.
pub struct PathMap<M> {
    root: Node<M>,
}

impl<M> Default for PathMap<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> PathMap<M> {
    /// Creates an empty path map.
    pub fn new() -> Self {
        Self {
            root: Node::Container(Container::default()),
        }
    }

    /// Materializes every node along `path`, creating containers and list
    /// elements as required; a no-op where they already exist.
    pub fn create(&mut self, path: &Value) -> Result<(), PathError> {
        create_in(&mut self.root, path).map(|_| ())
    }

    /// Returns the node at `path` exactly; no inheritance.
    pub fn mapnode(&self, path: &Value) -> Option<&Node<M>> {
        find(&self.root, path, false)
    }

    /// Returns the node at `path` exactly, mutable; no inheritance.
    pub fn mapnode_mut(&mut self, path: &Value) -> Option<&mut Node<M>> {
        find_mut(&mut self.root, path)
    }

    /// Walks as far as `path` allows and returns the deepest node actually
    /// present (inheritance fallback).
    pub fn mapnode_in_charge(&self, path: &Value) -> Option<&Node<M>> {
        find(&self.root, path, true)
    }

    /// Attaches `meta` to the node at `path`, creating the path as needed.
    ///
    /// There is no restriction on what metadata is. A handler object, a
    /// closure, or a tooth fairy instance: up to the caller.
    pub fn set_metadata(&mut self, path: &Value, meta: M) -> Result<(), PathError> {
        create_in(&mut self.root, path)?.set_meta(meta)
    }

    /// Returns the metadata governing `path`, honoring inheritance: the
    /// node's own metadata, or the nearest ancestor metadata along the walk.
    /// Metadata registered at the root (path `{}`) is the fallback for every
    /// query.
    pub fn metadata(&self, path: &Value) -> Option<M>
    where
        M: Clone,
    {
        find_meta(&self.root, path, None).cloned()
    }

    /// The root node.
    pub fn root(&self) -> &Node<M> {
        &self.root
    }

    /// Projects the map into a plain nested structure: empty containers are
    /// dropped unless they carry a `data` value, in which case the data
    /// replaces them; lists become sequences of element projections.
    pub fn to_data(&self) -> Option<Value> {
        project(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_list() -> Vec<Value> {
        ('a'..='j')
            .enumerate()
            .map(|(i, c)| json!({"key": i + 1, "value": c.to_string()}))
            .collect()
    }

    #[test]
    fn test_list_element_lookup_and_index() {
        let mut list: KeyedList<()> = KeyedList::new();
        let items = test_list();
        list.extend(items.iter()).unwrap();

        let found = list.lookup(&json!({"key": 9})).unwrap();
        assert_eq!(found.child_value("value"), Some(&json!("i")));
        assert_eq!(found.child_value("key"), Some(&json!(9)));

        // same answers once the index is configured
        list.set_key(&["key"]).unwrap();
        let found = list.lookup(&json!({"key": 9})).unwrap();
        assert_eq!(found.child_value("value"), Some(&json!("i")));

        // extra match pairs must still agree after an index hit
        assert!(list.lookup(&json!({"key": 9, "value": "i"})).is_some());
        assert!(list.lookup(&json!({"key": 9, "value": "x"})).is_none());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let mut list: KeyedList<()> = KeyedList::new();
        list.set_key(&["key"]).unwrap();
        list.push_literal(&json!({"key": 1, "value": "a"})).unwrap();
        let err = list.push_literal(&json!({"key": 1, "value": "b"})).unwrap_err();
        assert!(matches!(err, PathError::DuplicateKey));

        // set_key over existing duplicates fails too
        let mut list: KeyedList<()> = KeyedList::new();
        list.push_literal(&json!({"key": 1})).unwrap();
        list.push_literal(&json!({"key": 1})).unwrap();
        assert!(matches!(list.set_key(&["key"]), Err(PathError::DuplicateKey)));
    }

    #[test]
    fn test_container_path() {
        let mut pm: PathMap<i32> = PathMap::new();
        pm.set_metadata(&json!({"level1": {"level2": {}}}), 1).unwrap();
        // basic get
        assert_eq!(pm.metadata(&json!({"level1": {"level2": {}}})), Some(1));
        // wrong path with nothing inherited above
        assert_eq!(pm.metadata(&json!({"level1": {"level2-wrong": {}}})), None);
        // inherited get below the deepest materialized node
        assert_eq!(
            pm.metadata(&json!({"level1": {"level2": {"level3": {}}}})),
            Some(1)
        );
    }

    #[test]
    fn test_list_path() {
        let mut pm: PathMap<i32> = PathMap::new();
        pm.set_metadata(&json!({"level1": [{}]}), 1).unwrap();
        assert_eq!(pm.metadata(&json!({"level1": [{}]})), Some(1));
        assert_eq!(pm.metadata(&json!({"level1-wrong": [{}]})), None);
        // an element inherits from the whole list
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level2-value"}]})),
            Some(1)
        );
    }

    #[test]
    fn test_list_item_path() {
        let mut pm: PathMap<i32> = PathMap::new();
        pm.set_metadata(&json!({"level1": [{"level2": "level2-value"}]}), 1)
            .unwrap();
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level2-value"}]})),
            Some(1)
        );
        // nothing is set at the list level itself
        assert_eq!(pm.metadata(&json!({"level1": [{}]})), None);
        // a path below the element inherits from it
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level2-value", "content": {}}]})),
            Some(1)
        );
        // wrong key
        assert_eq!(pm.metadata(&json!({"level1": [{"level2": "level3-value"}]})), None);
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level3-value", "content": {}}]})),
            None
        );
    }

    #[test]
    fn test_list_item_multiple_elements() {
        let mut pm: PathMap<i32> = PathMap::new();
        pm.set_metadata(&json!({"level1": [{"level2": "level2-value1"}]}), 1)
            .unwrap();
        pm.set_metadata(&json!({"level1": [{"level2": "level2-value2"}]}), 2)
            .unwrap();
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level2-value1"}]})),
            Some(1)
        );
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level2-value2"}]})),
            Some(2)
        );
        assert_eq!(pm.metadata(&json!({"level1": [{}]})), None);
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level2-value1", "content": {}}]})),
            Some(1)
        );
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level2-value2", "content": {}}]})),
            Some(2)
        );
        assert_eq!(pm.metadata(&json!({"level1": [{"level2": "level3-value"}]})), None);
    }

    #[test]
    fn test_list_meta_is_fallback_for_missed_elements() {
        let mut pm: PathMap<String> = PathMap::new();
        pm.set_metadata(&json!({"level1": [{}]}), "list".to_string())
            .unwrap();
        pm.set_metadata(&json!({"level1": [{"level2": "level2-value1"}]}), "1".to_string())
            .unwrap();
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level2-value1"}]})),
            Some("1".to_string())
        );
        // a miss on the element key falls back to the list metadata
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level3-value"}]})),
            Some("list".to_string())
        );
        assert_eq!(
            pm.metadata(&json!({"level1": [{"level2": "level3-value", "content": {}}]})),
            Some("list".to_string())
        );
    }

    #[test]
    fn test_multi_key_path_level_reads_its_first_pair() {
        let mut pm: PathMap<i32> = PathMap::new();
        // two pairs at one level: the first-written pair is the path, extra
        // pairs are ignored
        pm.set_metadata(&json!({"zeta": {"inner": {}}, "alpha": {}}), 1)
            .unwrap();
        assert_eq!(pm.metadata(&json!({"zeta": {"inner": {}}})), Some(1));
        assert!(pm.mapnode(&json!({"zeta": {"inner": {}}})).is_some());
        // the ignored pair was never materialized
        assert!(pm.mapnode(&json!({"alpha": {}})).is_none());
        assert_eq!(pm.metadata(&json!({"alpha": {}})), None);
    }

    #[test]
    fn test_root_metadata_is_universal_fallback() {
        let mut pm: PathMap<&'static str> = PathMap::new();
        pm.set_metadata(&json!({}), "default").unwrap();
        assert_eq!(pm.metadata(&json!({"anything": {"below": {}}})), Some("default"));
        // intermediate nodes without metadata do not mask the fallback
        pm.create(&json!({"a": {"b": {}}})).unwrap();
        assert_eq!(pm.metadata(&json!({"a": {"b": {}}})), Some("default"));
    }

    #[test]
    fn test_mapnode_exact_and_in_charge() {
        let mut pm: PathMap<&'static str> = PathMap::new();
        let path = json!({"level1": [{"level2": "level3-value", "content": {}}]});
        pm.create(&path).unwrap();
        pm.mapnode_mut(&path).unwrap().set_meta("list").unwrap();
        assert_eq!(pm.metadata(&path), Some("list"));

        // the node at the path is the (empty) content container
        assert!(pm.mapnode(&path).unwrap().is_empty_container());

        // the element itself carries the created children
        let element = pm
            .mapnode(&json!({"level1": [{"level2": "level3-value"}]}))
            .unwrap();
        assert_eq!(element.child_value("level2"), Some(&json!("level3-value")));
        assert!(element.child("content").unwrap().is_empty_container());

        // mapnode does not inherit, mapnode_in_charge does
        let missing = json!({"level1": [{"level2": "level3-value", "content": {"deeper": {}}}]});
        assert!(pm.mapnode(&missing).is_none());
        assert!(pm.mapnode_in_charge(&missing).is_some());
    }

    #[test]
    fn test_created_list_respects_key_index() {
        let mut pm: PathMap<()> = PathMap::new();
        pm.create(&json!({"l": [{"k": 1}]})).unwrap();
        let list = pm
            .mapnode_mut(&json!({"l": []}))
            .and_then(Node::as_list_mut)
            .unwrap();
        list.set_key(&["k"]).unwrap();
        // an existing key is a no-op, a fresh key appends a new element
        pm.create(&json!({"l": [{"k": 1}]})).unwrap();
        pm.create(&json!({"l": [{"k": 2}]})).unwrap();
        let list = pm.mapnode(&json!({"l": []})).and_then(Node::as_list).unwrap();
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_data_slots_and_validator() {
        let mut pm: PathMap<()> = PathMap::new();
        pm.create(&json!({"a": {"b": {}}})).unwrap();
        let node = pm.mapnode_mut(&json!({"a": {"b": {}}})).unwrap();
        node.set_validator(Arc::new(|value| {
            value
                .as_i64()
                .map(Value::from)
                .ok_or_else(|| PathError::Validation("integer required".to_string()))
        }))
        .unwrap();
        assert!(node.set_data(json!("not an int")).is_err());
        node.set_data(json!(5)).unwrap();
        assert_eq!(pm.to_data(), Some(json!({"a": {"b": 5}})));
    }

    #[test]
    fn test_to_data_round_trip() {
        let mut pm: PathMap<()> = PathMap::new();
        let shape = json!({
            "interfaces": {
                "interface": [
                    {"name": "eth0", "mtu": 1500},
                    {"name": "eth1", "mtu": 9000},
                ],
                "enabled": true,
            },
        });
        pm.create(&shape).unwrap();
        assert_eq!(pm.to_data(), Some(shape));
    }

    #[test]
    fn test_to_data_drops_empty_containers() {
        let mut pm: PathMap<()> = PathMap::new();
        pm.create(&json!({"a": {"empty": {}}, "b": {"leaf": 1}})).unwrap();
        // "a" holds nothing but an empty container, so it projects away whole
        assert_eq!(pm.to_data(), Some(json!({"b": {"leaf": 1}})));

        // an empty container with data projects as that data
        let node = pm.mapnode_mut(&json!({"a": {"empty": {}}})).unwrap();
        node.set_data(json!("filled")).unwrap();
        assert_eq!(
            pm.to_data(),
            Some(json!({"a": {"empty": "filled"}, "b": {"leaf": 1}}))
        );
    }
}

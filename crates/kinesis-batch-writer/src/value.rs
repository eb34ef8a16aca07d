//! Shared-node structured values.
//!
//! [`StructuredValue`] mirrors the JSON data model, but objects are
//! reference-counted nodes that can be shared between parents. Sharing makes it
//! possible to build a graph where an object contains itself; the serializer
//! relies on [`StructuredValue::to_json`] to cut such cycles.

use parking_lot::Mutex;
use serde_json::{Map, Number, Value};
use std::sync::Arc;

/// Marker written in place of an object that is its own ancestor.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// A JSON-like value whose objects are shared nodes.
#[derive(Debug, Clone)]
pub enum StructuredValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<StructuredValue>),
    Object(ObjectNode),
}

/// A shared, mutable, insertion-ordered object.
///
/// Cloning an `ObjectNode` clones the handle, not the contents.
#[derive(Clone, Default)]
pub struct ObjectNode(Arc<Mutex<Vec<(String, StructuredValue)>>>);

// Field contents are not printed: a node may contain itself.
impl std::fmt::Debug for ObjectNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectNode")
            .field("fields", &self.len())
            .finish_non_exhaustive()
    }
}

impl ObjectNode {
    /// Create an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field. Replacing keeps the original position.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<StructuredValue>) {
        let key = key.into();
        let value = value.into();
        let mut fields = self.0.lock();
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => fields.push((key, value)),
        }
    }

    /// Get a clone of a field's value.
    pub fn get(&self, key: &str) -> Option<StructuredValue> {
        self.0
            .lock()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Whether the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Whether two handles point at the same node.
    pub fn ptr_eq(&self, other: &ObjectNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    fn snapshot(&self) -> Vec<(String, StructuredValue)> {
        self.0.lock().clone()
    }
}

impl StructuredValue {
    /// Deep-copy into a plain JSON tree.
    ///
    /// Objects already on the current path are written as [`CIRCULAR_MARKER`].
    /// An object reachable twice without a cycle is written in full both times.
    pub fn to_json(&self) -> Value {
        let mut ancestors = Vec::new();
        self.to_json_inner(&mut ancestors)
    }

    fn to_json_inner(&self, ancestors: &mut Vec<usize>) -> Value {
        match self {
            StructuredValue::Null => Value::Null,
            StructuredValue::Bool(b) => Value::Bool(*b),
            StructuredValue::Number(n) => Value::Number(n.clone()),
            StructuredValue::String(s) => Value::String(s.clone()),
            StructuredValue::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json_inner(ancestors))
                    .collect(),
            ),
            StructuredValue::Object(node) => {
                let id = node.id();
                if ancestors.contains(&id) {
                    return Value::String(CIRCULAR_MARKER.to_string());
                }

                // Snapshot releases the lock before recursing into children,
                // which may be this same node.
                let fields = node.snapshot();
                ancestors.push(id);
                let mut map = Map::with_capacity(fields.len());
                for (key, value) in &fields {
                    map.insert(key.clone(), value.to_json_inner(ancestors));
                }
                ancestors.pop();
                Value::Object(map)
            }
        }
    }
}

impl From<Value> for StructuredValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => StructuredValue::Null,
            Value::Bool(b) => StructuredValue::Bool(b),
            Value::Number(n) => StructuredValue::Number(n),
            Value::String(s) => StructuredValue::String(s),
            Value::Array(items) => {
                StructuredValue::Array(items.into_iter().map(StructuredValue::from).collect())
            }
            Value::Object(map) => {
                let node = ObjectNode::new();
                for (key, value) in map {
                    node.insert(key, StructuredValue::from(value));
                }
                StructuredValue::Object(node)
            }
        }
    }
}

impl From<ObjectNode> for StructuredValue {
    fn from(node: ObjectNode) -> Self {
        StructuredValue::Object(node)
    }
}

impl From<&str> for StructuredValue {
    fn from(s: &str) -> Self {
        StructuredValue::String(s.to_string())
    }
}

impl From<String> for StructuredValue {
    fn from(s: String) -> Self {
        StructuredValue::String(s)
    }
}

impl From<bool> for StructuredValue {
    fn from(b: bool) -> Self {
        StructuredValue::Bool(b)
    }
}

impl From<i64> for StructuredValue {
    fn from(n: i64) -> Self {
        StructuredValue::Number(n.into())
    }
}

impl From<u64> for StructuredValue {
    fn from(n: u64) -> Self {
        StructuredValue::Number(n.into())
    }
}

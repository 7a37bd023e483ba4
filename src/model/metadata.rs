// Opaque run metadata - arbitrary values that may reference each other
// Objects are shared through Rc, so a graph can contain cycles.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::{Map, Number, Value};

/// Arbitrary value attached to the run configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Value")]
pub enum MetadataValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<MetadataValue>),
    Object(Rc<MetadataObject>),
}

/// Ordered, interior-mutable field list; inserting a parent into its own
/// subtree is how cyclic metadata is built.
#[derive(Default)]
pub struct MetadataObject {
    fields: RefCell<Vec<(String, MetadataValue)>>,
}

// Fields may lead back to this object, so only the shape is printed
impl fmt::Debug for MetadataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataObject")
            .field("fields", &self.len())
            .finish()
    }
}

impl MetadataObject {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Insert or replace a field, keeping the original position on replace
    pub fn insert(&self, key: impl Into<String>, value: MetadataValue) {
        let key = key.into();
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => fields.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.borrow().is_empty()
    }
}

impl MetadataValue {
    pub fn object(object: &Rc<MetadataObject>) -> Self {
        Self::Object(Rc::clone(object))
    }

    /// Convert to JSON in a single pass, tolerating shared and cyclic objects.
    ///
    /// An object already emitted once in this pass is not emitted again: as an
    /// object field it is omitted, as an array element it becomes `null`.
    pub fn to_json(&self) -> Value {
        let mut seen = HashSet::new();
        self.to_json_tracked(&mut seen).unwrap_or(Value::Null)
    }

    fn to_json_tracked(&self, seen: &mut HashSet<*const MetadataObject>) -> Option<Value> {
        match self {
            Self::Null => Some(Value::Null),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::Number(n) => Some(Value::Number(n.clone())),
            Self::String(s) => Some(Value::String(s.clone())),
            Self::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json_tracked(seen).unwrap_or(Value::Null))
                    .collect(),
            )),
            Self::Object(object) => {
                if !seen.insert(Rc::as_ptr(object)) {
                    return None;
                }
                let mut map = Map::new();
                for (key, value) in object.fields.borrow().iter() {
                    if let Some(json) = value.to_json_tracked(seen) {
                        map.insert(key.clone(), json);
                    }
                }
                Some(Value::Object(map))
            }
        }
    }
}

impl From<Value> for MetadataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                let object = MetadataObject::new();
                for (key, value) in map {
                    object.insert(key, Self::from(value));
                }
                Self::Object(object)
            }
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

//! Property Kinds and Values
//!
//! Every persisted node property has a `PropertyKind` declared by its schema and
//! holds a `PropertyValue` of exactly that kind. `Text` is a string whose
//! overlaid annotation ranges are owned by annotation nodes elsewhere in the
//! document; `Id` and `IdList` are non-owning references to other nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a node, unique within its owning document
pub type NodeId = String;

/// Kind of a schema-declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyKind {
    String,
    Text,
    Number,
    Bool,
    Id,
    IdList,
}

impl PropertyKind {
    /// Zero value used when a caller needs a placeholder of this kind
    pub fn empty_value(self) -> PropertyValue {
        match self {
            PropertyKind::String => PropertyValue::String(String::new()),
            PropertyKind::Text => PropertyValue::Text(String::new()),
            PropertyKind::Number => PropertyValue::Number(0.0),
            PropertyKind::Bool => PropertyValue::Bool(false),
            PropertyKind::Id => PropertyValue::Id(String::new()),
            PropertyKind::IdList => PropertyValue::IdList(Vec::new()),
        }
    }

    /// Coerce a JSON value into a value of this kind
    ///
    /// JSON strings are accepted for `string`, `text` and `id`; arrays of
    /// strings for `id-list`. Returns `None` when the JSON shape does not fit.
    pub fn coerce_json(self, value: &serde_json::Value) -> Option<PropertyValue> {
        match (self, value) {
            (PropertyKind::String, serde_json::Value::String(s)) => {
                Some(PropertyValue::String(s.clone()))
            }
            (PropertyKind::Text, serde_json::Value::String(s)) => {
                Some(PropertyValue::Text(s.clone()))
            }
            (PropertyKind::Id, serde_json::Value::String(s)) => Some(PropertyValue::Id(s.clone())),
            (PropertyKind::Number, serde_json::Value::Number(n)) => {
                n.as_f64().map(PropertyValue::Number)
            }
            (PropertyKind::Bool, serde_json::Value::Bool(b)) => Some(PropertyValue::Bool(*b)),
            (PropertyKind::IdList, serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(PropertyValue::IdList),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::String => "string",
            PropertyKind::Text => "text",
            PropertyKind::Number => "number",
            PropertyKind::Bool => "bool",
            PropertyKind::Id => "id",
            PropertyKind::IdList => "id-list",
        };
        f.write_str(name)
    }
}

/// Typed value of a persisted property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum PropertyValue {
    String(String),
    Text(String),
    Number(f64),
    Bool(bool),
    Id(NodeId),
    IdList(Vec<NodeId>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Text(_) => PropertyKind::Text,
            PropertyValue::Number(_) => PropertyKind::Number,
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Id(_) => PropertyKind::Id,
            PropertyValue::IdList(_) => PropertyKind::IdList,
        }
    }

    /// Borrow the string payload of `string`, `text` and `id` values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) | PropertyValue::Text(s) | PropertyValue::Id(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_id_list(&self) -> Option<&[NodeId]> {
        match self {
            PropertyValue::IdList(ids) => Some(ids),
            _ => None,
        }
    }

    pub(crate) fn as_id_list_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            PropertyValue::IdList(ids) => Some(ids),
            _ => None,
        }
    }

    /// Untagged JSON form, the inverse of [`PropertyKind::coerce_json`]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::String(s) | PropertyValue::Text(s) | PropertyValue::Id(s) => {
                serde_json::Value::String(s.clone())
            }
            PropertyValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
            PropertyValue::IdList(ids) => serde_json::Value::Array(
                ids.iter()
                    .map(|id| serde_json::Value::String(id.clone()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

/// Persisted, schema-validated property values of one node
///
/// Ordered by name so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyStore {
    values: BTreeMap<String, PropertyValue>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.values.get_mut(name)
    }

    /// Store a value, returning the previous one
    pub(crate) fn insert(&mut self, name: String, value: PropertyValue) -> Option<PropertyValue> {
        self.values.insert(name, value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

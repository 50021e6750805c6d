//! Transient Display State
//!
//! Highlight flags and other undeclared, per-node fields used by rendering.
//! None of this is part of the persisted document: it is keyed by node id and
//! kept apart from the schema-validated `PropertyStore`.

use crate::models::NodeId;
use std::collections::{BTreeMap, HashMap};

/// Construction field that sets the highlight flag
pub const HIGHLIGHTED_FIELD: &str = "highlighted";

/// Accepted spellings of the construction field carrying the highlight scope
pub const HIGHLIGHTED_SCOPE_FIELDS: [&str; 2] = ["highlighted_scope", "highlightedScope"];

/// Whether `name` addresses the highlight flag or its scope rather than a free field
pub fn is_highlight_field(name: &str) -> bool {
    name == HIGHLIGHTED_FIELD || HIGHLIGHTED_SCOPE_FIELDS.contains(&name)
}

/// Display state of one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayState {
    pub highlighted: bool,
    pub highlighted_scope: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Display state of every node in a document
#[derive(Debug, Default)]
pub struct DisplayStateStore {
    states: HashMap<NodeId, DisplayState>,
}

impl DisplayStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node_id: &str) -> Option<&DisplayState> {
        self.states.get(node_id)
    }

    pub fn is_highlighted(&self, node_id: &str) -> bool {
        self.states.get(node_id).is_some_and(|s| s.highlighted)
    }

    /// Set the highlight flag; returns `false` and changes nothing when the
    /// flag already has that value
    pub fn set_highlighted(&mut self, node_id: &str, flag: bool, scope: Option<String>) -> bool {
        if self.is_highlighted(node_id) == flag {
            return false;
        }
        let state = self.states.entry(node_id.to_string()).or_default();
        state.highlighted = flag;
        state.highlighted_scope = scope;
        true
    }

    /// Store a transient field, returning the previous value
    pub fn set_field(
        &mut self,
        node_id: &str,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.states
            .entry(node_id.to_string())
            .or_default()
            .fields
            .insert(name.into(), value)
    }

    pub fn field(&self, node_id: &str, name: &str) -> Option<&serde_json::Value> {
        self.states.get(node_id).and_then(|s| s.fields.get(name))
    }

    pub fn remove(&mut self, node_id: &str) -> Option<DisplayState> {
        self.states.remove(node_id)
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

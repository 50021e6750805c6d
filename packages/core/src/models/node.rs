//! Node Data Structures
//!
//! This module defines the `Node` entity: an instance of a resolved
//! `NodeType` that owns its persisted, schema-validated property values.
//!
//! # Architecture
//!
//! - **Typed Properties**: values live in a `PropertyStore` checked against the type schema
//! - **Type-level Categories**: block/text/annotation flags come from the shared `NodeType`
//! - **Owned by a Document**: a node records the id of the document it was built for
//!   and is only mutated through that document; detached nodes record none
//! - **No display state**: highlight and other transient fields live in the
//!   document's `DisplayStateStore`, not here
//!
//! # Examples
//!
//! ```rust
//! use docgraph_core::models::{core_schema_registry, Node, NodeInit, PropertyValue};
//!
//! let registry = core_schema_registry().unwrap();
//! let node = Node::detached(
//!     &registry,
//!     NodeInit::new("paragraph")
//!         .with_id("p1")
//!         .with_property("content", PropertyValue::Text("Hello".into())),
//! )
//! .unwrap();
//!
//! assert!(node.is_text());
//! assert_eq!(node.get("content"), Some(&PropertyValue::Text("Hello".into())));
//! ```

use crate::models::{
    NodeId, NodeType, PropertyStore, PropertyValue, SchemaRegistry, SchemaValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a `Document`, recorded on every node built for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Initial state for a new node
///
/// # Examples
///
/// ```rust
/// # use docgraph_core::models::{NodeInit, PropertyValue};
/// let init = NodeInit::new("figure")
///     .with_id("fig1")
///     .with_parent("body")
///     .with_property("label", PropertyValue::String("Fig. 1".into()));
/// assert_eq!(init.node_type, "figure");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInit {
    /// Explicit id; a UUID is generated when `None`
    pub id: Option<NodeId>,

    pub node_type: String,

    pub parent: Option<NodeId>,

    /// Declared properties plus any transient fields
    pub properties: BTreeMap<String, PropertyValue>,
}

impl NodeInit {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

/// A typed, schema-validated unit of document structure
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    node_type: Arc<NodeType>,
    parent: Option<NodeId>,
    properties: PropertyStore,
    document: Option<DocumentId>,
}

impl Node {
    /// Build a node that belongs to no document
    ///
    /// Undeclared entries in `init.properties` are dropped: a detached node has
    /// no display-state store to hold them.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError` if the type is unknown or a property
    /// disagrees with the schema.
    pub fn detached(
        registry: &SchemaRegistry,
        init: NodeInit,
    ) -> Result<Self, SchemaValidationError> {
        let (node, transient) = Self::build(registry, init, None)?;
        if !transient.is_empty() {
            tracing::debug!(
                "Dropping {} transient fields of detached node {}",
                transient.len(),
                node.id
            );
        }
        Ok(node)
    }

    /// Build a node and split off undeclared (transient) entries
    pub(crate) fn build(
        registry: &SchemaRegistry,
        init: NodeInit,
        document: Option<DocumentId>,
    ) -> Result<(Self, BTreeMap<String, PropertyValue>), SchemaValidationError> {
        let node_type = registry
            .get(&init.node_type)
            .ok_or_else(|| SchemaValidationError::unknown_node_type(&init.node_type))?;
        let (properties, transient) = node_type.instantiate(init.properties)?;
        let id = init.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok((
            Self {
                id,
                node_type,
                parent: init.parent,
                properties,
                document,
            },
            transient,
        ))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    pub fn type_name(&self) -> &str {
        self.node_type.name()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// The document this node was built for, `None` when detached
    pub fn document_id(&self) -> Option<DocumentId> {
        self.document
    }

    pub fn is_detached(&self) -> bool {
        self.document.is_none()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn is_block(&self) -> bool {
        self.node_type.is_block()
    }

    pub fn is_text(&self) -> bool {
        self.node_type.is_text()
    }

    pub fn is_property_annotation(&self) -> bool {
        self.node_type.is_property_annotation()
    }

    pub fn is_inline(&self) -> bool {
        self.node_type.is_inline()
    }

    pub fn is_container_annotation(&self) -> bool {
        self.node_type.is_container_annotation()
    }

    /// Ordered child ids; empty for leaf types
    pub fn child_ids(&self) -> &[NodeId] {
        self.node_type.child_ids(&self.properties)
    }

    pub fn has_children(&self) -> bool {
        !self.child_ids().is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.child_ids().len()
    }

    /// Set a declared property, returning the previous value
    ///
    /// Nodes inside a document are only reachable by shared reference, so this
    /// is only callable on detached nodes; document nodes change through
    /// `Document::set`, which also dispatches change events.
    pub fn set(
        &mut self,
        name: &str,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>, SchemaValidationError> {
        self.node_type.check_value(name, &value)?;
        Ok(self.properties.insert(name.to_string(), value))
    }

    pub(crate) fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }
}

//! Document Error Types
//!
//! Errors raised by document operations: lookups, structural queries,
//! mutations and subscriptions.

use crate::models::SchemaValidationError;
use thiserror::Error;

/// Document operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// Property values disagree with the node type's schema
    #[error("Schema validation failed: {0}")]
    SchemaValidation(#[from] SchemaValidationError),

    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    #[error("Duplicate node id: {id}")]
    DuplicateId { id: String },

    /// A reference held by a node does not resolve in the document
    #[error("Node {node_id} references missing node '{target}'")]
    UnresolvedReference { node_id: String, target: String },

    /// The parent chain loops back on itself
    #[error("Cyclic parent chain from node {node_id}: {}", chain.join(" -> "))]
    CyclicStructure { node_id: String, chain: Vec<String> },

    #[error("Parent chain of node {node_id} exceeds {limit} levels")]
    ParentChainTooDeep { node_id: String, limit: usize },

    #[error("Node {id} is detached from any document")]
    DetachedNode { id: String },

    #[error("Node {id} belongs to another document")]
    ForeignDocument { id: String },

    #[error("Property '{property}' is not declared by node {node_id}")]
    UnknownProperty { node_id: String, property: String },

    #[error("Property '{property}' of node {node_id} is not an id-list")]
    NotAList { node_id: String, property: String },

    #[error("Index {index} out of range for '{property}' of node {node_id} (len {len})")]
    IndexOutOfRange {
        node_id: String,
        property: String,
        index: usize,
        len: usize,
    },

    /// Removal refused while another live node names this one as parent
    #[error("Node {id} is still the parent of {child}")]
    StillReferenced { id: String, child: String },

    #[error("Unknown event proxy: {name}")]
    UnknownEventProxy { name: String },

    #[error("Invalid properties: {0}")]
    InvalidProperties(String),
}

impl DocumentError {
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    pub fn unresolved_reference(node_id: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            node_id: node_id.into(),
            target: target.into(),
        }
    }

    pub fn cyclic_structure(node_id: impl Into<String>, chain: Vec<String>) -> Self {
        Self::CyclicStructure {
            node_id: node_id.into(),
            chain,
        }
    }

    pub fn unknown_property(node_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            node_id: node_id.into(),
            property: property.into(),
        }
    }

    pub fn invalid_properties(msg: impl Into<String>) -> Self {
        Self::InvalidProperties(msg.into())
    }
}

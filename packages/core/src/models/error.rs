//! Model Error Types
//!
//! `SchemaError` covers failures while resolving the type registry;
//! `SchemaValidationError` covers node values that disagree with a resolved
//! schema.

use crate::models::PropertyKind;
use thiserror::Error;

/// Errors raised while registering or resolving node type descriptors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Node type '{name}' is registered twice")]
    DuplicateType { name: String },

    #[error("Node type '{node_type}' extends unknown type '{parent}'")]
    UnknownParentType { node_type: String, parent: String },

    #[error("Cyclic type extension: {}", chain.join(" -> "))]
    CyclicExtends { chain: Vec<String> },

    #[error("Default for '{node_type}.{property}' must be {expected}, got {actual}")]
    InvalidDefault {
        node_type: String,
        property: String,
        expected: PropertyKind,
        actual: PropertyKind,
    },

    #[error("Children property '{node_type}.{property}' must be a declared id-list")]
    InvalidChildrenProperty { node_type: String, property: String },

    #[error("Invalid type descriptor: {0}")]
    InvalidDescriptor(String),
}

impl SchemaError {
    pub fn duplicate_type(name: impl Into<String>) -> Self {
        Self::DuplicateType { name: name.into() }
    }

    pub fn unknown_parent(node_type: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::UnknownParentType {
            node_type: node_type.into(),
            parent: parent.into(),
        }
    }

    pub fn invalid_descriptor(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptor(msg.into())
    }
}

/// Node property values that do not match their type's schema
///
/// Fatal to the constructing or mutating call: no node is created and no
/// value is changed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaValidationError {
    #[error("Unknown node type: {node_type}")]
    UnknownNodeType { node_type: String },

    #[error("Property '{node_type}.{property}' expects {expected}, got {actual}")]
    KindMismatch {
        node_type: String,
        property: String,
        expected: PropertyKind,
        actual: PropertyKind,
    },

    #[error("Property '{node_type}.{property}' expects {expected}, got JSON {value}")]
    InvalidJson {
        node_type: String,
        property: String,
        expected: PropertyKind,
        value: serde_json::Value,
    },

    #[error("Missing required property '{node_type}.{property}'")]
    MissingRequired { node_type: String, property: String },

    #[error("Property '{property}' is not declared by '{node_type}'")]
    UndeclaredProperty { node_type: String, property: String },
}

impl SchemaValidationError {
    pub fn unknown_node_type(node_type: impl Into<String>) -> Self {
        Self::UnknownNodeType {
            node_type: node_type.into(),
        }
    }

    pub fn kind_mismatch(
        node_type: impl Into<String>,
        property: impl Into<String>,
        expected: PropertyKind,
        actual: PropertyKind,
    ) -> Self {
        Self::KindMismatch {
            node_type: node_type.into(),
            property: property.into(),
            expected,
            actual,
        }
    }

    pub fn missing_required(node_type: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MissingRequired {
            node_type: node_type.into(),
            property: property.into(),
        }
    }

    pub fn undeclared(node_type: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UndeclaredProperty {
            node_type: node_type.into(),
            property: property.into(),
        }
    }
}

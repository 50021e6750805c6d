//! Data Models
//!
//! This module contains the core data structures of the document node model:
//!
//! - `Node` - Typed, schema-validated unit of document structure
//! - `SchemaRegistry` - Resolved node types (schema + category flags)
//! - `PropertyValue` / `PropertyKind` - Typed property values
//! - `DisplayStateStore` - Non-persisted highlight and transient fields
//!
//! Persisted properties and display state are deliberately separate stores,
//! both addressed by node id.

mod core_schemas;
mod display_state;
mod error;
mod node;
mod property;
pub mod schema;

#[cfg(test)]
mod node_test;

pub use core_schemas::{core_schema_registry, core_type_descriptors};
pub use display_state::{
    is_highlight_field, DisplayState, DisplayStateStore, HIGHLIGHTED_FIELD,
    HIGHLIGHTED_SCOPE_FIELDS,
};
pub use error::{SchemaError, SchemaValidationError};
pub use node::{DocumentId, Node, NodeInit};
pub use property::{NodeId, PropertyKind, PropertyStore, PropertyValue};
pub use schema::{
    CategoryFlags, CategoryOverrides, NodeType, NodeTypeDescriptor, PropertyDef, SchemaRegistry,
    SchemaRegistryBuilder,
};

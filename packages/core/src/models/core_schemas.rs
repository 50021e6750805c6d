//! Core Schema Definitions
//!
//! The node types every document can use out of the box.
//!
//! ## Core Types
//!
//! - **node** - Base of every core type, no properties
//! - **text-node** - Text block with `content`; **paragraph** and **heading** extend it
//! - **figure** - Block with `label`, `title`, `caption`; **image-figure** adds a required `src`
//! - **container** - Ordered block children in `nodes`
//! - **annotation** - Property annotation over a text range; **strong**, **emphasis**,
//!   **link** extend it, **inline-node** additionally marks itself inline
//! - **container-annotation** - Range spanning several blocks; **comment** extends it
//!
//! ## Usage
//!
//! Call `core_schema_registry()` for a resolved registry, or start from
//! `core_type_descriptors()` to add application types before building.

use crate::models::schema::{NodeTypeDescriptor, PropertyDef, SchemaRegistry};
use crate::models::{PropertyKind, PropertyValue, SchemaError};

fn empty_default(kind: PropertyKind) -> PropertyDef {
    PropertyDef::new(kind).with_default(kind.empty_value())
}

/// Descriptors of all core node types
pub fn core_type_descriptors() -> Vec<NodeTypeDescriptor> {
    vec![
        NodeTypeDescriptor::new("node"),
        // Text blocks
        NodeTypeDescriptor::new("text-node")
            .extends("node")
            .block(true)
            .text(true)
            .property("content", empty_default(PropertyKind::Text)),
        NodeTypeDescriptor::new("paragraph").extends("text-node"),
        NodeTypeDescriptor::new("heading").extends("text-node").property(
            "level",
            PropertyDef::new(PropertyKind::Number).with_default(PropertyValue::Number(1.0)),
        ),
        // Figures: label and caption fields default to empty
        NodeTypeDescriptor::new("figure")
            .extends("node")
            .block(true)
            .property("label", empty_default(PropertyKind::String))
            .property("title", empty_default(PropertyKind::Text))
            .property("caption", empty_default(PropertyKind::Text)),
        NodeTypeDescriptor::new("image-figure")
            .extends("figure")
            .property("src", PropertyDef::new(PropertyKind::String).required()),
        NodeTypeDescriptor::new("container")
            .extends("node")
            .property("nodes", empty_default(PropertyKind::IdList))
            .children("nodes"),
        // Annotations over a single text property
        NodeTypeDescriptor::new("annotation")
            .extends("node")
            .property_annotation(true)
            .property("node", PropertyDef::new(PropertyKind::Id).required())
            .property(
                "property",
                PropertyDef::new(PropertyKind::String)
                    .with_default(PropertyValue::String("content".into())),
            )
            .property("start", empty_default(PropertyKind::Number))
            .property("end", empty_default(PropertyKind::Number)),
        NodeTypeDescriptor::new("strong").extends("annotation"),
        NodeTypeDescriptor::new("emphasis").extends("annotation"),
        NodeTypeDescriptor::new("link")
            .extends("annotation")
            .property("url", empty_default(PropertyKind::String)),
        NodeTypeDescriptor::new("inline-node")
            .extends("annotation")
            .inline(true),
        // Annotations spanning blocks of a container
        NodeTypeDescriptor::new("container-annotation")
            .extends("node")
            .container_annotation(true)
            .property("container", PropertyDef::new(PropertyKind::Id).required())
            .property("start_node", PropertyDef::new(PropertyKind::Id).required())
            .property("start_offset", empty_default(PropertyKind::Number))
            .property("end_node", PropertyDef::new(PropertyKind::Id).required())
            .property("end_offset", empty_default(PropertyKind::Number)),
        NodeTypeDescriptor::new("comment")
            .extends("container-annotation")
            .property("body", empty_default(PropertyKind::Text)),
    ]
}

/// Resolved registry of the core node types
pub fn core_schema_registry() -> Result<SchemaRegistry, SchemaError> {
    let mut builder = SchemaRegistry::builder();
    for descriptor in core_type_descriptors() {
        builder.register(descriptor)?;
    }
    builder.build()
}

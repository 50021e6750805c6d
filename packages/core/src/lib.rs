//! DocGraph Core Document Model
//!
//! This crate provides the schema-validated node model and change routing
//! underneath the DocGraph editor.
//!
//! # Architecture
//!
//! - **Schema Registry**: Node types declare typed properties and inherit along `extends`
//! - **Arena Document**: The `Document` owns every node; relations are stored as ids
//! - **Path Routing**: A property change reaches only subscribers of that `(node, property)` path
//! - **Display State**: Highlight and transient fields live beside, not inside, node properties
//!
//! # Modules
//!
//! - [`models`] - Property values, node types, schema registry, nodes
//! - [`document`] - Document container, structural queries, mutations
//! - [`events`] - Path event proxy and node-local event hub
//! - [`config`] - Per-document settings

pub mod config;
pub mod document;
pub mod events;
pub mod models;

// Re-export commonly used types
pub use config::{ConfigError, DocumentConfig};
pub use document::{Document, DocumentError, NodeRef};
pub use events::*;
pub use models::*;

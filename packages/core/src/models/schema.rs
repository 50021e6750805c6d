//! Node Type Schemas
//!
//! Every node type is described by a `NodeTypeDescriptor`: a map of typed
//! property definitions, per-flag category overrides, an optional `extends`
//! parent and, for container types, the id-list property that stores children.
//!
//! Descriptors are collected in a `SchemaRegistryBuilder` and resolved once by
//! `build()`. Resolution walks each `extends` chain explicitly, so a resolved
//! `NodeType` already carries its full inherited schema and category flags and
//! no lookups along the chain happen after startup.
//!
//! ## Example Descriptor (JSON)
//!
//! ```json
//! {
//!   "name": "heading",
//!   "extends": "text-node",
//!   "properties": {
//!     "level": { "kind": "number", "default": 1 }
//!   },
//!   "categories": { "block": true }
//! }
//! ```

use crate::models::{
    NodeId, PropertyKind, PropertyStore, PropertyValue, SchemaError, SchemaValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Declaration of a single typed property
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPropertyDef")]
pub struct PropertyDef {
    pub kind: PropertyKind,

    /// Value applied when construction omits the property
    pub default: Option<PropertyValue>,

    /// Whether construction must supply the property when no default exists
    pub required: bool,
}

impl PropertyDef {
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            default: None,
            required: false,
        }
    }

    pub fn with_default(mut self, default: PropertyValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// JSON shape of a property definition; defaults are plain JSON coerced by kind
#[derive(Deserialize)]
struct RawPropertyDef {
    kind: PropertyKind,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    required: bool,
}

impl TryFrom<RawPropertyDef> for PropertyDef {
    type Error = String;

    fn try_from(raw: RawPropertyDef) -> Result<Self, Self::Error> {
        let default = match raw.default {
            Some(json) => Some(
                raw.kind
                    .coerce_json(&json)
                    .ok_or_else(|| format!("default {} is not a valid {}", json, raw.kind))?,
            ),
            None => None,
        };
        Ok(Self {
            kind: raw.kind,
            default,
            required: raw.required,
        })
    }
}

/// Resolved structural role flags of a node type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFlags {
    pub block: bool,
    pub text: bool,
    pub property_annotation: bool,
    pub inline: bool,
    pub container_annotation: bool,
}

/// Per-flag overrides declared by one descriptor; `None` inherits from the parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryOverrides {
    pub block: Option<bool>,
    pub text: Option<bool>,
    pub property_annotation: Option<bool>,
    pub inline: Option<bool>,
    pub container_annotation: Option<bool>,
}

impl CategoryFlags {
    fn apply(mut self, overrides: &CategoryOverrides) -> Self {
        if let Some(block) = overrides.block {
            self.block = block;
        }
        if let Some(text) = overrides.text {
            self.text = text;
        }
        if let Some(property_annotation) = overrides.property_annotation {
            self.property_annotation = property_annotation;
        }
        if let Some(inline) = overrides.inline {
            self.inline = inline;
        }
        if let Some(container_annotation) = overrides.container_annotation {
            self.container_annotation = container_annotation;
        }
        self
    }
}

/// Data description of a node type before resolution
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeTypeDescriptor {
    pub name: String,

    #[serde(default)]
    pub extends: Option<String>,

    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDef>,

    #[serde(default)]
    pub categories: CategoryOverrides,

    /// Id-list property holding ordered children (container types only)
    #[serde(default)]
    pub children: Option<String>,
}

impl NodeTypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            properties: BTreeMap::new(),
            categories: CategoryOverrides::default(),
            children: None,
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, def: PropertyDef) -> Self {
        self.properties.insert(name.into(), def);
        self
    }

    pub fn children(mut self, property: impl Into<String>) -> Self {
        self.children = Some(property.into());
        self
    }

    pub fn block(mut self, flag: bool) -> Self {
        self.categories.block = Some(flag);
        self
    }

    pub fn text(mut self, flag: bool) -> Self {
        self.categories.text = Some(flag);
        self
    }

    pub fn property_annotation(mut self, flag: bool) -> Self {
        self.categories.property_annotation = Some(flag);
        self
    }

    pub fn inline(mut self, flag: bool) -> Self {
        self.categories.inline = Some(flag);
        self
    }

    pub fn container_annotation(mut self, flag: bool) -> Self {
        self.categories.container_annotation = Some(flag);
        self
    }
}

/// A fully resolved node type
///
/// Holds the merged schema of the whole `extends` chain. Instances share one
/// `Arc<NodeType>`, so category queries are a field read.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeType {
    name: String,
    /// This type followed by its ancestors, nearest first
    lineage: Vec<String>,
    properties: BTreeMap<String, PropertyDef>,
    categories: CategoryFlags,
    children: Option<String>,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// True if this type is `name` or extends it, directly or transitively
    pub fn is_instance_of(&self, name: &str) -> bool {
        self.lineage.iter().any(|t| t == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.get(name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyDef)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn categories(&self) -> CategoryFlags {
        self.categories
    }

    pub fn children_property(&self) -> Option<&str> {
        self.children.as_deref()
    }

    pub fn is_block(&self) -> bool {
        self.categories.block
    }

    pub fn is_text(&self) -> bool {
        self.categories.text
    }

    pub fn is_property_annotation(&self) -> bool {
        self.categories.property_annotation
    }

    pub fn is_inline(&self) -> bool {
        self.categories.inline
    }

    pub fn is_container_annotation(&self) -> bool {
        self.categories.container_annotation
    }

    /// Check a single value against the declared kind of `property`
    pub fn check_value(
        &self,
        property: &str,
        value: &PropertyValue,
    ) -> Result<(), SchemaValidationError> {
        let def = self
            .properties
            .get(property)
            .ok_or_else(|| SchemaValidationError::undeclared(&self.name, property))?;
        if def.kind != value.kind() {
            return Err(SchemaValidationError::kind_mismatch(
                &self.name,
                property,
                def.kind,
                value.kind(),
            ));
        }
        Ok(())
    }

    /// Validate an initial property set and apply defaults
    ///
    /// Declared properties are kind-checked, then filled from declared
    /// defaults, then rejected if required; otherwise they stay unset.
    /// Undeclared entries are returned untouched for the caller to treat as
    /// transient fields.
    pub(crate) fn instantiate(
        &self,
        mut init: BTreeMap<String, PropertyValue>,
    ) -> Result<(PropertyStore, BTreeMap<String, PropertyValue>), SchemaValidationError> {
        for (name, value) in &init {
            if let Some(def) = self.properties.get(name) {
                if value.kind() != def.kind {
                    return Err(SchemaValidationError::kind_mismatch(
                        &self.name,
                        name,
                        def.kind,
                        value.kind(),
                    ));
                }
            }
        }

        let mut store = PropertyStore::new();
        for (name, def) in &self.properties {
            match init.remove(name) {
                Some(value) => {
                    store.insert(name.clone(), value);
                }
                None => {
                    if let Some(default) = &def.default {
                        store.insert(name.clone(), default.clone());
                    } else if def.required {
                        return Err(SchemaValidationError::missing_required(&self.name, name));
                    }
                }
            }
        }
        Ok((store, init))
    }

    /// Coerce a JSON object into typed values for this type
    ///
    /// Undeclared keys are carried over as-is for transient handling.
    pub(crate) fn coerce_json_object(
        &self,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<
        (
            BTreeMap<String, PropertyValue>,
            BTreeMap<String, serde_json::Value>,
        ),
        SchemaValidationError,
    > {
        let mut typed = BTreeMap::new();
        let mut untyped = BTreeMap::new();
        for (name, json) in object {
            match self.properties.get(name) {
                Some(def) => {
                    let value = def.kind.coerce_json(json).ok_or_else(|| {
                        SchemaValidationError::InvalidJson {
                            node_type: self.name.clone(),
                            property: name.clone(),
                            expected: def.kind,
                            value: json.clone(),
                        }
                    })?;
                    typed.insert(name.clone(), value);
                }
                None => {
                    untyped.insert(name.clone(), json.clone());
                }
            }
        }
        Ok((typed, untyped))
    }

    /// Ids stored in the children property, empty for leaf types
    pub(crate) fn child_ids<'a>(&self, store: &'a PropertyStore) -> &'a [NodeId] {
        self.children
            .as_deref()
            .and_then(|prop| store.get(prop))
            .and_then(PropertyValue::as_id_list)
            .unwrap_or(&[])
    }
}

/// Collects descriptors until they are resolved into a `SchemaRegistry`
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    descriptors: BTreeMap<String, NodeTypeDescriptor>,
}

impl SchemaRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: NodeTypeDescriptor) -> Result<&mut Self, SchemaError> {
        if self.descriptors.contains_key(&descriptor.name) {
            return Err(SchemaError::duplicate_type(&descriptor.name));
        }
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        Ok(self)
    }

    /// Register a descriptor, or an array of descriptors, given as JSON
    pub fn register_json(&mut self, json: serde_json::Value) -> Result<&mut Self, SchemaError> {
        let parsed = if json.is_array() {
            serde_json::from_value::<Vec<NodeTypeDescriptor>>(json)
        } else {
            serde_json::from_value::<NodeTypeDescriptor>(json).map(|d| vec![d])
        };
        let descriptors = parsed.map_err(|e| SchemaError::invalid_descriptor(e.to_string()))?;

        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(self)
    }

    /// Resolve every registered type along its `extends` chain
    pub fn build(&self) -> Result<SchemaRegistry, SchemaError> {
        let mut resolved = HashMap::new();
        for name in self.descriptors.keys() {
            let mut visiting = Vec::new();
            self.resolve(name, &mut resolved, &mut visiting)?;
        }
        tracing::debug!("Resolved {} node types", resolved.len());
        Ok(SchemaRegistry { types: resolved })
    }

    fn resolve(
        &self,
        name: &str,
        resolved: &mut HashMap<String, Arc<NodeType>>,
        visiting: &mut Vec<String>,
    ) -> Result<Arc<NodeType>, SchemaError> {
        if let Some(done) = resolved.get(name) {
            return Ok(done.clone());
        }
        if visiting.iter().any(|v| v == name) {
            let mut chain = visiting.clone();
            chain.push(name.to_string());
            return Err(SchemaError::CyclicExtends { chain });
        }
        let descriptor = self
            .descriptors
            .get(name)
            .ok_or_else(|| SchemaError::invalid_descriptor(format!("unknown type '{}'", name)))?;

        visiting.push(name.to_string());
        let base = match &descriptor.extends {
            Some(parent) => {
                if !self.descriptors.contains_key(parent) {
                    return Err(SchemaError::unknown_parent(name, parent));
                }
                Some(self.resolve(parent, resolved, visiting)?)
            }
            None => None,
        };
        visiting.pop();

        for (property, def) in &descriptor.properties {
            if let Some(default) = &def.default {
                if default.kind() != def.kind {
                    return Err(SchemaError::InvalidDefault {
                        node_type: name.to_string(),
                        property: property.clone(),
                        expected: def.kind,
                        actual: default.kind(),
                    });
                }
            }
        }

        let mut lineage = vec![name.to_string()];
        let mut properties = BTreeMap::new();
        let mut categories = CategoryFlags::default();
        let mut children = None;
        if let Some(base) = &base {
            lineage.extend(base.lineage.iter().cloned());
            properties = base.properties.clone();
            categories = base.categories;
            children = base.children.clone();
        }
        properties.extend(
            descriptor
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        let categories = categories.apply(&descriptor.categories);
        if descriptor.children.is_some() {
            children = descriptor.children.clone();
        }

        if let Some(prop) = &children {
            let is_list = properties
                .get(prop)
                .is_some_and(|def| def.kind == PropertyKind::IdList);
            if !is_list {
                return Err(SchemaError::InvalidChildrenProperty {
                    node_type: name.to_string(),
                    property: prop.clone(),
                });
            }
        }

        let node_type = Arc::new(NodeType {
            name: name.to_string(),
            lineage,
            properties,
            categories,
            children,
        });
        resolved.insert(name.to_string(), node_type.clone());
        Ok(node_type)
    }
}

/// Immutable registry of resolved node types
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, Arc<NodeType>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<Arc<NodeType>> {
        self.types.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered type names in sorted order
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn figure_registry() -> SchemaRegistry {
        let mut builder = SchemaRegistry::builder();
        builder
            .register(
                NodeTypeDescriptor::new("figure")
                    .block(true)
                    .property(
                        "label",
                        PropertyDef::new(PropertyKind::String)
                            .with_default(PropertyValue::String(String::new())),
                    )
                    .property(
                        "title",
                        PropertyDef::new(PropertyKind::Text)
                            .with_default(PropertyValue::Text(String::new())),
                    ),
            )
            .unwrap()
            .register(
                NodeTypeDescriptor::new("image-figure")
                    .extends("figure")
                    .property("src", PropertyDef::new(PropertyKind::String).required())
                    .property(
                        "label",
                        PropertyDef::new(PropertyKind::String)
                            .with_default(PropertyValue::String("Figure".into())),
                    ),
            )
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_extension_inherits_schema_and_flags() {
        let registry = figure_registry();
        let image = registry.get("image-figure").unwrap();

        assert!(image.declares("title"));
        assert!(image.declares("src"));
        assert!(image.is_block());
        assert!(!image.is_text());
        assert_eq!(image.lineage(), ["image-figure", "figure"]);
        assert!(image.is_instance_of("figure"));
        assert!(!registry.get("figure").unwrap().is_instance_of("image-figure"));
    }

    #[test]
    fn test_extension_overrides_property() {
        let registry = figure_registry();
        let label = registry.get("image-figure").unwrap().property("label").cloned();
        assert_eq!(
            label.unwrap().default,
            Some(PropertyValue::String("Figure".into()))
        );
        let base_label = registry.get("figure").unwrap().property("label").cloned();
        assert_eq!(
            base_label.unwrap().default,
            Some(PropertyValue::String(String::new()))
        );
    }

    #[test]
    fn test_category_override_can_clear_flag() {
        let mut builder = SchemaRegistry::builder();
        builder
            .register(NodeTypeDescriptor::new("a").block(true).text(true))
            .unwrap()
            .register(NodeTypeDescriptor::new("b").extends("a").block(false))
            .unwrap();
        let registry = builder.build().unwrap();
        let b = registry.get("b").unwrap();
        assert!(!b.is_block());
        assert!(b.is_text());
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut builder = SchemaRegistry::builder();
        builder.register(NodeTypeDescriptor::new("a")).unwrap();
        let err = builder.register(NodeTypeDescriptor::new("a")).unwrap_err();
        assert_eq!(err, SchemaError::duplicate_type("a"));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut builder = SchemaRegistry::builder();
        builder
            .register(NodeTypeDescriptor::new("a").extends("missing"))
            .unwrap();
        let err = builder.build().unwrap_err();
        assert_eq!(err, SchemaError::unknown_parent("a", "missing"));
    }

    #[test]
    fn test_cyclic_extends_rejected() {
        let mut builder = SchemaRegistry::builder();
        builder
            .register(NodeTypeDescriptor::new("a").extends("b"))
            .unwrap()
            .register(NodeTypeDescriptor::new("b").extends("a"))
            .unwrap();
        match builder.build().unwrap_err() {
            SchemaError::CyclicExtends { chain } => {
                assert_eq!(chain.first(), chain.last());
                assert_eq!(chain.len(), 3);
            }
            other => panic!("Expected CyclicExtends, got {:?}", other),
        }
    }

    #[test]
    fn test_default_kind_checked() {
        let mut builder = SchemaRegistry::builder();
        builder
            .register(NodeTypeDescriptor::new("a").property(
                "n",
                PropertyDef::new(PropertyKind::Number).with_default(PropertyValue::Bool(true)),
            ))
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(SchemaError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn test_children_property_must_be_id_list() {
        let mut builder = SchemaRegistry::builder();
        builder
            .register(
                NodeTypeDescriptor::new("box")
                    .property("nodes", PropertyDef::new(PropertyKind::String))
                    .children("nodes"),
            )
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(SchemaError::InvalidChildrenProperty { .. })
        ));
    }

    #[test]
    fn test_register_json_descriptors() {
        let mut builder = SchemaRegistry::builder();
        builder
            .register_json(json!([
                {
                    "name": "text-node",
                    "properties": { "content": { "kind": "text", "default": "" } },
                    "categories": { "text": true, "block": true }
                },
                {
                    "name": "heading",
                    "extends": "text-node",
                    "properties": { "level": { "kind": "number", "default": 1 } }
                }
            ]))
            .unwrap();
        let registry = builder.build().unwrap();
        let heading = registry.get("heading").unwrap();

        assert!(heading.is_text());
        assert_eq!(
            heading.property("level").unwrap().default,
            Some(PropertyValue::Number(1.0))
        );
        assert_eq!(heading.property("content").unwrap().kind, PropertyKind::Text);
        assert_eq!(registry.type_names(), vec!["heading", "text-node"]);
    }

    #[test]
    fn test_register_json_rejects_bad_default() {
        let mut builder = SchemaRegistry::builder();
        let err = builder
            .register_json(json!({
                "name": "a",
                "properties": { "n": { "kind": "number", "default": "one" } }
            }))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDescriptor(_)));
    }
}

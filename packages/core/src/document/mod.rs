//! Document
//!
//! The `Document` owns every live node, resolves ids, and hosts the event
//! routing:
//!
//! - one or more named `PathEventProxy` registries (`"path"` always exists)
//! - the `LocalEventHub` for node-local events
//! - the `DisplayStateStore` for highlight and other transient fields
//!
//! # Event Flow
//!
//! 1. `Document::set` validates the value against the node type's schema and stores it
//! 2. The change is delivered to each proxy, reaching only subscribers of that exact path
//! 3. The node re-emits it locally as `"<property>:changed"`
//!
//! The registries are created with the document and torn down when it is
//! dropped.
//!
//! # Examples
//!
//! ```rust
//! use docgraph_core::models::{core_schema_registry, NodeInit, PropertyValue};
//! use docgraph_core::events::{listener, ListenerContext};
//! use docgraph_core::document::Document;
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! let mut doc = Document::new(Arc::new(core_schema_registry().unwrap()));
//! let id = doc.create(NodeInit::new("paragraph").with_id("p1")).unwrap();
//!
//! let calls = Rc::new(Cell::new(0));
//! let seen = calls.clone();
//! let on_change = listener(move |_| seen.set(seen.get() + 1));
//! doc.on(&id, "content:changed", ListenerContext::new(), on_change).unwrap();
//!
//! doc.set(&id, "content", PropertyValue::Text("Hello".into())).unwrap();
//! assert_eq!(calls.get(), 1);
//! ```

mod error;
mod node_ref;

pub use error::DocumentError;
pub use node_ref::NodeRef;

use crate::config::{ConfigError, DocumentConfig, PATH_PROXY};
use crate::events::{
    changed_event_name, Change, EventKind, Listener, ListenerContext, LocalEventHub, NodeEvent,
    PathEventProxy, PropertyChange, SubscriptionId, HIGHLIGHTED_EVENT,
};
use crate::models::{
    is_highlight_field, DisplayState, DisplayStateStore, DocumentId, Node, NodeId, NodeInit,
    PropertyKind, PropertyValue, SchemaRegistry, SchemaValidationError, HIGHLIGHTED_FIELD,
    HIGHLIGHTED_SCOPE_FIELDS,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

pub struct Document {
    id: DocumentId,
    config: DocumentConfig,
    schema: Arc<SchemaRegistry>,
    nodes: HashMap<NodeId, Node>,
    path_proxy: PathEventProxy,
    extra_proxies: BTreeMap<String, PathEventProxy>,
    local: LocalEventHub,
    display: DisplayStateStore,
}

impl Document {
    /// Create an empty document with the default configuration
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self::build(schema, DocumentConfig::default())
    }

    /// Create an empty document with a validated configuration
    pub fn with_config(
        schema: Arc<SchemaRegistry>,
        config: DocumentConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(schema, config))
    }

    fn build(schema: Arc<SchemaRegistry>, config: DocumentConfig) -> Self {
        let extra_proxies = config
            .extra_proxies
            .iter()
            .map(|name| (name.clone(), PathEventProxy::new(name)))
            .collect();
        let id = DocumentId::new();
        tracing::debug!("Created document {}", id);

        Self {
            id,
            config,
            schema,
            nodes: HashMap::new(),
            path_proxy: PathEventProxy::new(PATH_PROXY),
            extra_proxies,
            local: LocalEventHub::new(),
            display: DisplayStateStore::new(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    // Node set

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Live node with its structural queries
    pub fn node(&self, id: &str) -> Result<NodeRef<'_>, DocumentError> {
        self.nodes
            .get(id)
            .map(|node| NodeRef::new(self, node))
            .ok_or_else(|| DocumentError::node_not_found(id))
    }

    /// Structural view of a node held outside the document
    ///
    /// # Errors
    ///
    /// - `DetachedNode` if the node was built without a document
    /// - `ForeignDocument` if it was built for another document
    pub fn view<'d>(&'d self, node: &'d Node) -> Result<NodeRef<'d>, DocumentError> {
        match node.document_id() {
            None => Err(DocumentError::DetachedNode {
                id: node.id().to_string(),
            }),
            Some(owner) if owner != self.id => Err(DocumentError::ForeignDocument {
                id: node.id().to_string(),
            }),
            Some(_) => Ok(NodeRef::new(self, node)),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Create a node from typed initial values
    ///
    /// Undeclared entries become transient display fields (see
    /// `DocumentConfig::allow_transient_properties`).
    ///
    /// # Errors
    ///
    /// - `DuplicateId` if the id is already live
    /// - `SchemaValidation` if the type is unknown or a value disagrees with
    ///   the schema; nothing is inserted
    pub fn create(&mut self, init: NodeInit) -> Result<NodeId, DocumentError> {
        if let Some(id) = &init.id {
            if self.nodes.contains_key(id) {
                return Err(DocumentError::duplicate_id(id));
            }
        }
        let (node, transient) = Node::build(&self.schema, init, Some(self.id))?;
        let transient = transient
            .into_iter()
            .map(|(name, value)| (name, value.to_json()))
            .collect();
        self.insert(node, transient)
    }

    /// Create a node from a JSON object, coercing values by declared kind
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use docgraph_core::models::core_schema_registry;
    /// # use docgraph_core::document::Document;
    /// # use std::sync::Arc;
    /// let mut doc = Document::new(Arc::new(core_schema_registry().unwrap()));
    /// let id = doc
    ///     .create_from_json(
    ///         "container",
    ///         Some("body"),
    ///         None,
    ///         &serde_json::json!({ "nodes": ["p1", "p2"] }),
    ///     )
    ///     .unwrap();
    /// assert_eq!(doc.get(&id).unwrap().child_count(), 2);
    /// ```
    pub fn create_from_json(
        &mut self,
        node_type: &str,
        id: Option<&str>,
        parent: Option<&str>,
        properties: &serde_json::Value,
    ) -> Result<NodeId, DocumentError> {
        let object = properties.as_object().ok_or_else(|| {
            DocumentError::invalid_properties("properties must be a JSON object")
        })?;
        let resolved = self
            .schema
            .get(node_type)
            .ok_or_else(|| SchemaValidationError::unknown_node_type(node_type))?;
        let (typed, untyped) = resolved.coerce_json_object(object)?;

        let init = NodeInit {
            id: id.map(str::to_string),
            node_type: node_type.to_string(),
            parent: parent.map(str::to_string),
            properties: typed,
        };
        if let Some(id) = &init.id {
            if self.nodes.contains_key(id) {
                return Err(DocumentError::duplicate_id(id));
            }
        }
        let (node, _) = Node::build(&self.schema, init, Some(self.id))?;
        self.insert(node, untyped)
    }

    fn insert(
        &mut self,
        node: Node,
        mut transient: BTreeMap<String, serde_json::Value>,
    ) -> Result<NodeId, DocumentError> {
        if self.nodes.contains_key(node.id()) {
            return Err(DocumentError::duplicate_id(node.id()));
        }
        let (highlighted, scope) = take_highlight_fields(&mut transient)?;
        if !self.config.allow_transient_properties {
            if let Some(name) = transient.keys().next() {
                return Err(SchemaValidationError::undeclared(node.type_name(), name).into());
            }
        }

        let id = node.id().to_string();
        if highlighted {
            self.display.set_highlighted(&id, true, scope);
        }
        for (name, value) in transient {
            self.display.set_field(&id, name, value);
        }
        tracing::debug!("Created {} node {}", node.type_name(), id);
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Remove a node together with its subscriptions and display state
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the id is not live
    /// - `StillReferenced` while another live node names it as parent
    pub fn remove(&mut self, id: &str) -> Result<Node, DocumentError> {
        if !self.nodes.contains_key(id) {
            return Err(DocumentError::node_not_found(id));
        }
        if let Some(child) = self.nodes.values().find(|n| n.parent_id() == Some(id)) {
            return Err(DocumentError::StillReferenced {
                id: id.to_string(),
                child: child.id().to_string(),
            });
        }

        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| DocumentError::node_not_found(id))?;
        let mut dropped = self.path_proxy.remove_node(id);
        for proxy in self.extra_proxies.values() {
            dropped += proxy.remove_node(id);
        }
        dropped += self.local.remove_node(id);
        self.display.remove(id);
        tracing::debug!("Removed node {} ({} subscriptions dropped)", id, dropped);
        Ok(node)
    }

    // Mutation

    /// Replace a declared property, returning the previous value
    ///
    /// Dispatches the change to every proxy and re-emits it on the node
    /// before returning.
    pub fn set(
        &mut self,
        id: &str,
        property: &str,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>, DocumentError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DocumentError::node_not_found(id))?;
        node.node_type().check_value(property, &value)?;
        let old = node
            .properties_mut()
            .insert(property.to_string(), value.clone());

        self.dispatch_change(PropertyChange {
            node_id: id.to_string(),
            property: property.to_string(),
            change: Change::Set {
                old: old.clone(),
                new: value,
            },
        });
        Ok(old)
    }

    /// Insert `child` into an id-list property at `index`
    pub fn insert_at(
        &mut self,
        id: &str,
        property: &str,
        index: usize,
        child: impl Into<NodeId>,
    ) -> Result<(), DocumentError> {
        let child = child.into();
        let list = self.id_list_mut(id, property)?;
        if index > list.len() {
            return Err(DocumentError::IndexOutOfRange {
                node_id: id.to_string(),
                property: property.to_string(),
                index,
                len: list.len(),
            });
        }
        list.insert(index, child.clone());

        self.dispatch_change(PropertyChange {
            node_id: id.to_string(),
            property: property.to_string(),
            change: Change::ListInsert { index, id: child },
        });
        Ok(())
    }

    /// Remove the id at `index` from an id-list property
    pub fn remove_at(
        &mut self,
        id: &str,
        property: &str,
        index: usize,
    ) -> Result<NodeId, DocumentError> {
        let list = self.id_list_mut(id, property)?;
        if index >= list.len() {
            return Err(DocumentError::IndexOutOfRange {
                node_id: id.to_string(),
                property: property.to_string(),
                index,
                len: list.len(),
            });
        }
        let removed = list.remove(index);

        self.dispatch_change(PropertyChange {
            node_id: id.to_string(),
            property: property.to_string(),
            change: Change::ListRemove {
                index,
                id: removed.clone(),
            },
        });
        Ok(removed)
    }

    fn id_list_mut(&mut self, id: &str, property: &str) -> Result<&mut Vec<NodeId>, DocumentError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DocumentError::node_not_found(id))?;
        let kind = node
            .node_type()
            .property(property)
            .map(|def| def.kind)
            .ok_or_else(|| DocumentError::unknown_property(id, property))?;
        if kind != PropertyKind::IdList {
            return Err(DocumentError::NotAList {
                node_id: id.to_string(),
                property: property.to_string(),
            });
        }

        let store = node.properties_mut();
        if !store.contains(property) {
            store.insert(property.to_string(), PropertyKind::IdList.empty_value());
        }
        store
            .get_mut(property)
            .and_then(PropertyValue::as_id_list_mut)
            .ok_or_else(|| DocumentError::NotAList {
                node_id: id.to_string(),
                property: property.to_string(),
            })
    }

    fn dispatch_change(&self, change: PropertyChange) {
        let mut delivered = self.path_proxy.notify(&change);
        for proxy in self.extra_proxies.values() {
            delivered += proxy.notify(&change);
        }
        let event_name = changed_event_name(&change.property);
        let node_id = change.node_id.clone();
        let event = NodeEvent::PropertyChanged(change);
        delivered += self.local.emit(&node_id, &event_name, &event);
        tracing::debug!(
            "Dispatched {} on {} to {} listeners",
            event_name,
            node_id,
            delivered
        );
    }

    // Display state

    /// Set a transient display field and emit `"<name>:changed"` locally
    ///
    /// # Errors
    ///
    /// `InvalidProperties` if `name` is a declared (persisted) property or
    /// one of the highlight fields, which go through `set_highlighted`.
    pub fn set_transient(
        &mut self,
        id: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<Option<serde_json::Value>, DocumentError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| DocumentError::node_not_found(id))?;
        if node.node_type().declares(name) {
            return Err(DocumentError::invalid_properties(format!(
                "'{}' is a declared property of '{}'",
                name,
                node.type_name()
            )));
        }
        if is_highlight_field(name) {
            return Err(DocumentError::invalid_properties(format!(
                "'{}' is highlight state; use set_highlighted",
                name
            )));
        }

        let old = self.display.set_field(id, name, value.clone());
        let event = NodeEvent::TransientChanged {
            node_id: id.to_string(),
            name: name.to_string(),
            old: old.clone(),
            new: value,
        };
        self.local.emit(id, &changed_event_name(name), &event);
        Ok(old)
    }

    /// Set the highlight flag; returns whether it flipped
    ///
    /// Re-setting the current flag changes nothing and emits nothing. A flip
    /// stores `scope` and emits `"highlighted"` on the node.
    pub fn set_highlighted(
        &mut self,
        id: &str,
        flag: bool,
        scope: Option<&str>,
    ) -> Result<bool, DocumentError> {
        if !self.nodes.contains_key(id) {
            return Err(DocumentError::node_not_found(id));
        }
        let scope = scope.map(str::to_string);
        if !self.display.set_highlighted(id, flag, scope.clone()) {
            return Ok(false);
        }

        let event = NodeEvent::Highlighted {
            node_id: id.to_string(),
            flag,
            scope,
        };
        self.local.emit(id, HIGHLIGHTED_EVENT, &event);
        Ok(true)
    }

    pub fn is_highlighted(&self, id: &str) -> bool {
        self.display.is_highlighted(id)
    }

    pub fn display_state(&self, id: &str) -> Option<&DisplayState> {
        self.display.get(id)
    }

    /// Emit an ad hoc event on a node; returns the number of listeners invoked
    pub fn emit(
        &self,
        id: &str,
        name: &str,
        payload: serde_json::Value,
    ) -> Result<usize, DocumentError> {
        if !self.nodes.contains_key(id) {
            return Err(DocumentError::node_not_found(id));
        }
        let event = NodeEvent::Custom {
            node_id: id.to_string(),
            name: name.to_string(),
            payload,
        };
        Ok(self.local.emit(id, name, &event))
    }

    // Subscriptions

    /// Named path proxy handle
    pub fn event_proxy(&self, name: &str) -> Result<PathEventProxy, DocumentError> {
        if name == PATH_PROXY {
            return Ok(self.path_proxy.clone());
        }
        self.extra_proxies
            .get(name)
            .cloned()
            .ok_or_else(|| DocumentError::UnknownEventProxy {
                name: name.to_string(),
            })
    }

    /// Handle to the node-local event hub
    pub fn local_events(&self) -> LocalEventHub {
        self.local.clone()
    }

    /// Subscribe to an event on a node
    ///
    /// `"<p>:changed"` for a property `p` declared by the node's type goes to
    /// the `"path"` proxy; every other name is a node-local event.
    pub fn on(
        &self,
        id: &str,
        event_name: &str,
        context: ListenerContext,
        listener: Listener,
    ) -> Result<SubscriptionId, DocumentError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| DocumentError::node_not_found(id))?;
        Ok(self.subscribe(EventKind::classify(node, event_name), context, listener))
    }

    /// Subscribe to changes of one declared property
    pub fn on_property(
        &self,
        id: &str,
        property: &str,
        context: ListenerContext,
        listener: Listener,
    ) -> Result<SubscriptionId, DocumentError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| DocumentError::node_not_found(id))?;
        if !node.node_type().declares(property) {
            return Err(DocumentError::unknown_property(id, property));
        }
        Ok(self.path_proxy.subscribe(id, property, context, listener))
    }

    /// Subscribe with an event kind classified against a live node
    fn subscribe(
        &self,
        kind: EventKind,
        context: ListenerContext,
        listener: Listener,
    ) -> SubscriptionId {
        match kind {
            EventKind::PropertyChanged { node, property } => {
                self.path_proxy.subscribe(&node, &property, context, listener)
            }
            EventKind::Generic { node, name } => {
                self.local.subscribe(&node, &name, context, listener)
            }
        }
    }

    /// Remove subscriptions of `context` made through a node
    ///
    /// With an event name, removes the matching path subscriptions (declared
    /// property) or local ones (anything else), optionally only those using
    /// `listener`. Without one, removes every proxy subscription of
    /// `context` plus its local subscriptions on this node. Returns the number
    /// removed; repeating a removal is a no-op.
    pub fn off(
        &self,
        id: &str,
        context: ListenerContext,
        event_name: Option<&str>,
        listener: Option<&Listener>,
    ) -> usize {
        match event_name {
            Some(name) => {
                let kind = match self.nodes.get(id) {
                    Some(node) => EventKind::classify(node, name),
                    None => return 0,
                };
                match kind {
                    EventKind::PropertyChanged { node, property } => {
                        self.path_proxy.unsubscribe_matching(
                            context,
                            Some((node.as_str(), property.as_str())),
                            listener,
                        )
                    }
                    EventKind::Generic { node, name } => self.local.unsubscribe_matching(
                        context,
                        Some(node.as_str()),
                        Some(name.as_str()),
                        listener,
                    ),
                }
            }
            None => {
                let mut removed = self.path_proxy.unsubscribe_matching(context, None, listener);
                for proxy in self.extra_proxies.values() {
                    removed += proxy.unsubscribe_matching(context, None, listener);
                }
                removed + self
                    .local
                    .unsubscribe_matching(context, Some(id), None, listener)
            }
        }
    }

    /// Remove every subscription of `context` across the document
    pub fn off_context(&self, context: ListenerContext) -> usize {
        let mut removed = self.path_proxy.unsubscribe_context(context);
        for proxy in self.extra_proxies.values() {
            removed += proxy.unsubscribe_context(context);
        }
        removed + self.local.unsubscribe_matching(context, None, None, None)
    }

    /// Remove one subscription by id from whichever registry holds it
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.path_proxy.unsubscribe(subscription)
            || self
                .extra_proxies
                .values()
                .any(|proxy| proxy.unsubscribe(subscription))
            || self.local.unsubscribe(subscription)
    }
}

/// Pull the highlight flag and scope out of construction-time transient fields
fn take_highlight_fields(
    transient: &mut BTreeMap<String, serde_json::Value>,
) -> Result<(bool, Option<String>), DocumentError> {
    let highlighted = match transient.remove(HIGHLIGHTED_FIELD) {
        None => false,
        Some(value) => value.as_bool().ok_or_else(|| {
            DocumentError::invalid_properties(format!(
                "'{}' must be a boolean, got {}",
                HIGHLIGHTED_FIELD, value
            ))
        })?,
    };

    let mut scope = None;
    for name in HIGHLIGHTED_SCOPE_FIELDS {
        match transient.remove(name) {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::String(s)) => scope = Some(s),
            Some(value) => {
                return Err(DocumentError::invalid_properties(format!(
                    "'{}' must be a string, got {}",
                    name, value
                )));
            }
        }
    }
    Ok((highlighted, scope))
}

impl Drop for Document {
    fn drop(&mut self) {
        let mut dropped = self.path_proxy.clear();
        for proxy in self.extra_proxies.values() {
            dropped += proxy.clear();
        }
        dropped += self.local.clear();
        self.display.clear();
        tracing::debug!(
            "Dropped document {} ({} subscriptions torn down)",
            self.id,
            dropped
        );
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("path_proxy", &self.path_proxy)
            .field("extra_proxies", &self.extra_proxies.keys().collect::<Vec<_>>())
            .field("local", &self.local)
            .finish()
    }
}

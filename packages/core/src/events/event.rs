//! Event Types
//!
//! Events delivered to listeners, the tagged `EventKind` a subscription is
//! classified into, and the identity types used to own and remove
//! subscriptions.

use crate::models::{Node, NodeId, PropertyValue};
use serde::Serialize;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Suffix of the event name a node emits when one of its properties changes
pub const CHANGED_SUFFIX: &str = ":changed";

/// Name of the local event fired when a node's highlight flag flips
pub const HIGHLIGHTED_EVENT: &str = "highlighted";

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);
static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// `"<property>:changed"`
pub fn changed_event_name(property: &str) -> String {
    format!("{}{}", property, CHANGED_SUFFIX)
}

/// Owner token grouping subscriptions so they can be removed together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerContext(u64);

impl ListenerContext {
    pub fn new() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle of one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

/// What happened to a property
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Change {
    /// Whole value replaced
    Set {
        old: Option<PropertyValue>,
        new: PropertyValue,
    },
    /// Id inserted into an id-list at `index`
    ListInsert { index: usize, id: NodeId },
    /// Id removed from an id-list at `index`
    ListRemove { index: usize, id: NodeId },
}

/// A change to one `(node, property)` path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyChange {
    pub node_id: NodeId,
    pub property: String,
    pub change: Change,
}

/// Event delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    PropertyChanged(PropertyChange),

    /// A transient display field changed
    TransientChanged {
        node_id: NodeId,
        name: String,
        old: Option<serde_json::Value>,
        new: serde_json::Value,
    },

    Highlighted {
        node_id: NodeId,
        flag: bool,
        scope: Option<String>,
    },

    /// Ad hoc node-level signal
    Custom {
        node_id: NodeId,
        name: String,
        payload: serde_json::Value,
    },
}

impl NodeEvent {
    pub fn node_id(&self) -> &str {
        match self {
            NodeEvent::PropertyChanged(change) => &change.node_id,
            NodeEvent::TransientChanged { node_id, .. }
            | NodeEvent::Highlighted { node_id, .. }
            | NodeEvent::Custom { node_id, .. } => node_id,
        }
    }

    /// Name the event is emitted under on its node
    pub fn event_name(&self) -> String {
        match self {
            NodeEvent::PropertyChanged(change) => changed_event_name(&change.property),
            NodeEvent::TransientChanged { name, .. } => changed_event_name(name),
            NodeEvent::Highlighted { .. } => HIGHLIGHTED_EVENT.to_string(),
            NodeEvent::Custom { name, .. } => name.clone(),
        }
    }

    pub fn as_property_change(&self) -> Option<&PropertyChange> {
        match self {
            NodeEvent::PropertyChanged(change) => Some(change),
            _ => None,
        }
    }
}

/// Event callback; identity for removal is the `Rc` allocation
pub type Listener = Rc<dyn Fn(&NodeEvent)>;

/// Wrap a closure as a `Listener`
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&NodeEvent) + 'static,
{
    Rc::new(f)
}

pub(crate) fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Routing class of a subscription, fixed when it is made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Change of a schema-declared property, routed through the path proxy
    PropertyChanged { node: NodeId, property: String },

    /// Any other name, handled as a node-local event
    Generic { node: NodeId, name: String },
}

impl EventKind {
    /// Classify `event_name` for `node` by schema membership
    ///
    /// `"<p>:changed"` where `p` is declared by the node's type is a property
    /// subscription; every other name is generic.
    pub fn classify(node: &Node, event_name: &str) -> Self {
        match event_name.strip_suffix(CHANGED_SUFFIX) {
            Some(property) if node.node_type().declares(property) => EventKind::PropertyChanged {
                node: node.id().to_string(),
                property: property.to_string(),
            },
            _ => EventKind::Generic {
                node: node.id().to_string(),
                name: event_name.to_string(),
            },
        }
    }

    pub fn node_id(&self) -> &str {
        match self {
            EventKind::PropertyChanged { node, .. } | EventKind::Generic { node, .. } => node,
        }
    }

    pub fn event_name(&self) -> String {
        match self {
            EventKind::PropertyChanged { property, .. } => changed_event_name(property),
            EventKind::Generic { name, .. } => name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{core_schema_registry, NodeInit};

    #[test]
    fn test_classify_by_schema_membership() {
        let registry = core_schema_registry().unwrap();
        let node = Node::detached(&registry, NodeInit::new("paragraph").with_id("p1")).unwrap();

        assert_eq!(
            EventKind::classify(&node, "content:changed"),
            EventKind::PropertyChanged {
                node: "p1".into(),
                property: "content".into()
            }
        );
        assert_eq!(
            EventKind::classify(&node, "caption:changed"),
            EventKind::Generic {
                node: "p1".into(),
                name: "caption:changed".into()
            }
        );
        assert!(matches!(
            EventKind::classify(&node, "content"),
            EventKind::Generic { .. }
        ));
        assert!(matches!(
            EventKind::classify(&node, "highlighted"),
            EventKind::Generic { .. }
        ));
    }

    #[test]
    fn test_event_names() {
        let change = NodeEvent::PropertyChanged(PropertyChange {
            node_id: "p1".into(),
            property: "content".into(),
            change: Change::Set {
                old: None,
                new: PropertyValue::Text("a".into()),
            },
        });
        assert_eq!(change.event_name(), "content:changed");
        assert_eq!(change.node_id(), "p1");

        let highlighted = NodeEvent::Highlighted {
            node_id: "p1".into(),
            flag: true,
            scope: None,
        };
        assert_eq!(highlighted.event_name(), HIGHLIGHTED_EVENT);
        assert!(highlighted.as_property_change().is_none());
    }

    #[test]
    fn test_listener_identity() {
        let a = listener(|_| {});
        let b = listener(|_| {});
        assert!(same_listener(&a, &a.clone()));
        assert!(!same_listener(&a, &b));
    }

    #[test]
    fn test_contexts_are_unique() {
        assert_ne!(ListenerContext::new(), ListenerContext::new());
    }
}

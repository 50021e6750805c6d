//! Node-Local Events
//!
//! Listeners attached to a node under an event name that is not a declared
//! property change: `"highlighted"`, transient field changes, ad hoc signals.
//! Like `PathEventProxy`, the hub is a shared handle so listeners may
//! (un)subscribe while being dispatched.

use crate::events::event::same_listener;
use crate::events::subscribers::{dispatch, EventPath, SubscriptionIndex};
use crate::events::{Listener, ListenerContext, NodeEvent, SubscriptionId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct LocalEventHub {
    index: Rc<RefCell<SubscriptionIndex>>,
}

impl LocalEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        node_id: &str,
        event_name: &str,
        context: ListenerContext,
        listener: Listener,
    ) -> SubscriptionId {
        let id = self
            .index
            .borrow_mut()
            .add(EventPath::new(node_id, event_name), context, listener);
        tracing::debug!("Local hub subscribed {:?} to {} '{}'", id, node_id, event_name);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.index.borrow_mut().remove_id(id);
        if removed {
            tracing::debug!("Local hub unsubscribed {:?}", id);
        }
        removed
    }

    /// Remove subscriptions of `context`, optionally limited to one node, one
    /// event name on it, and one listener
    pub fn unsubscribe_matching(
        &self,
        context: ListenerContext,
        node_id: Option<&str>,
        event_name: Option<&str>,
        listener: Option<&Listener>,
    ) -> usize {
        let removed = self.index.borrow_mut().remove_where(|path, s| {
            s.context == context
                && node_id.map_or(true, |n| path.node_id == n)
                && event_name.map_or(true, |e| path.name == e)
                && listener.map_or(true, |l| same_listener(l, &s.listener))
        });
        if removed > 0 {
            tracing::debug!("Local hub removed {} subscriptions of {:?}", removed, context);
        }
        removed
    }

    pub fn remove_node(&self, node_id: &str) -> usize {
        self.index.borrow_mut().remove_node(node_id)
    }

    /// Emit `event` under `event_name` to listeners of `node_id`
    pub fn emit(&self, node_id: &str, event_name: &str, event: &NodeEvent) -> usize {
        let snapshot = self
            .index
            .borrow()
            .snapshot(&EventPath::new(node_id, event_name));
        dispatch(&snapshot, event)
    }

    pub fn subscriber_count(&self, node_id: &str, event_name: &str) -> usize {
        self.index
            .borrow()
            .count(&EventPath::new(node_id, event_name))
    }

    pub fn len(&self) -> usize {
        self.index.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> usize {
        let dropped = self.index.borrow_mut().take_all();
        dropped.len()
    }
}

impl fmt::Debug for LocalEventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEventHub")
            .field("subscriptions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::listener;
    use std::cell::Cell;

    fn ping(node_id: &str) -> NodeEvent {
        NodeEvent::Custom {
            node_id: node_id.into(),
            name: "ping".into(),
            payload: serde_json::json!({ "n": 1 }),
        }
    }

    #[test]
    fn test_emit_reaches_only_named_listeners_of_node() {
        let hub = LocalEventHub::new();
        let calls = Rc::new(Cell::new(0));
        let calls_in = calls.clone();
        hub.subscribe(
            "n1",
            "ping",
            ListenerContext::new(),
            listener(move |event| {
                assert_eq!(event.node_id(), "n1");
                calls_in.set(calls_in.get() + 1);
            }),
        );

        assert_eq!(hub.emit("n1", "ping", &ping("n1")), 1);
        assert_eq!(hub.emit("n1", "pong", &ping("n1")), 0);
        assert_eq!(hub.emit("n2", "ping", &ping("n2")), 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unsubscribe_context_on_one_node() {
        let hub = LocalEventHub::new();
        let ctx = ListenerContext::new();
        hub.subscribe("n1", "ping", ctx, listener(|_| {}));
        hub.subscribe("n1", "highlighted", ctx, listener(|_| {}));
        hub.subscribe("n2", "ping", ctx, listener(|_| {}));

        assert_eq!(hub.unsubscribe_matching(ctx, Some("n1"), None, None), 2);
        assert_eq!(hub.len(), 1);
        assert_eq!(hub.unsubscribe_matching(ctx, None, None, None), 1);
        assert!(hub.is_empty());
    }

    #[test]
    fn test_unsubscribe_by_id_is_idempotent() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        let hub = LocalEventHub::new();
        let id = hub.subscribe("n1", "ping", ListenerContext::new(), listener(|_| {}));
        assert_eq!(hub.subscriber_count("n1", "ping"), 1);

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(hub.emit("n1", "ping", &ping("n1")), 0);
    }
}

//! Path Event Proxy
//!
//! Document-scoped dispatcher keyed by `(node id, property)`. Observers that
//! only care about one property of one node (a caption view, say) subscribe
//! here without holding the node, and are invoked only for changes to that
//! exact path.
//!
//! `PathEventProxy` is a cheap handle: clones share one registry, so a listener
//! can capture a clone and unsubscribe itself while being dispatched.

use crate::events::subscribers::{dispatch, EventPath, SubscriptionIndex};
use crate::events::{Listener, ListenerContext, NodeEvent, PropertyChange, SubscriptionId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub struct PathEventProxy {
    name: Rc<str>,
    index: Rc<RefCell<SubscriptionIndex>>,
}

impl PathEventProxy {
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            index: Rc::new(RefCell::new(SubscriptionIndex::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Listen for changes of `property` on `node_id`
    pub fn subscribe(
        &self,
        node_id: &str,
        property: &str,
        context: ListenerContext,
        listener: Listener,
    ) -> SubscriptionId {
        let id = self
            .index
            .borrow_mut()
            .add(EventPath::new(node_id, property), context, listener);
        tracing::debug!(
            "Proxy '{}' subscribed {:?} to {}.{}",
            self.name,
            id,
            node_id,
            property
        );
        id
    }

    /// Remove one subscription; `false` if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.index.borrow_mut().remove_id(id);
        if removed {
            tracing::debug!("Proxy '{}' unsubscribed {:?}", self.name, id);
        }
        removed
    }

    /// Remove subscriptions of `context`, optionally limited to one
    /// `(node, property)` path and one listener
    pub fn unsubscribe_matching(
        &self,
        context: ListenerContext,
        path: Option<(&str, &str)>,
        listener: Option<&Listener>,
    ) -> usize {
        let path = path.map(|(node_id, property)| EventPath::new(node_id, property));
        let removed = self
            .index
            .borrow_mut()
            .remove_matching(context, path.as_ref(), listener);
        if removed > 0 {
            tracing::debug!(
                "Proxy '{}' removed {} subscriptions of {:?}",
                self.name,
                removed,
                context
            );
        }
        removed
    }

    pub fn unsubscribe_context(&self, context: ListenerContext) -> usize {
        self.unsubscribe_matching(context, None, None)
    }

    /// Drop every subscription on a removed node
    pub fn remove_node(&self, node_id: &str) -> usize {
        self.index.borrow_mut().remove_node(node_id)
    }

    /// Deliver a change to the subscribers of its exact path
    ///
    /// Returns the number of listeners invoked.
    pub fn notify(&self, change: &PropertyChange) -> usize {
        let path = EventPath::new(change.node_id.as_str(), change.property.as_str());
        let snapshot = self.index.borrow().snapshot(&path);
        if snapshot.is_empty() {
            return 0;
        }
        dispatch(&snapshot, &NodeEvent::PropertyChanged(change.clone()))
    }

    pub fn subscriber_count(&self, node_id: &str, property: &str) -> usize {
        self.index
            .borrow()
            .count(&EventPath::new(node_id, property))
    }

    pub fn len(&self) -> usize {
        self.index.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every subscription
    ///
    /// Listeners often capture a handle to this proxy; clearing breaks those
    /// reference cycles.
    pub fn clear(&self) -> usize {
        let dropped = self.index.borrow_mut().take_all();
        dropped.len()
    }
}

impl fmt::Debug for PathEventProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathEventProxy")
            .field("name", &self.name)
            .field("subscriptions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{listener, Change};
    use crate::models::PropertyValue;
    use std::cell::Cell;

    fn text_change(node_id: &str, property: &str, new: &str) -> PropertyChange {
        PropertyChange {
            node_id: node_id.into(),
            property: property.into(),
            change: Change::Set {
                old: None,
                new: PropertyValue::Text(new.into()),
            },
        }
    }

    fn counter() -> (Rc<Cell<usize>>, Listener) {
        let calls = Rc::new(Cell::new(0));
        let calls_in = calls.clone();
        (calls, listener(move |_| calls_in.set(calls_in.get() + 1)))
    }

    #[test]
    fn test_only_exact_path_notified() {
        let proxy = PathEventProxy::new("path");
        let (calls, l) = counter();
        proxy.subscribe("n1", "content", ListenerContext::new(), l);

        assert_eq!(proxy.notify(&text_change("n1", "content", "a")), 1);
        assert_eq!(proxy.notify(&text_change("n1", "title", "a")), 0);
        assert_eq!(proxy.notify(&text_change("n2", "content", "a")), 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_listener_can_unsubscribe_itself_during_dispatch() {
        let proxy = PathEventProxy::new("path");
        let ctx = ListenerContext::new();
        let id_cell: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let (later_calls, later) = counter();

        let handle = proxy.clone();
        let own_id = id_cell.clone();
        let first_calls = Rc::new(Cell::new(0));
        let first_in = first_calls.clone();
        let id = proxy.subscribe(
            "n1",
            "content",
            ctx,
            listener(move |_| {
                first_in.set(first_in.get() + 1);
                if let Some(id) = own_id.get() {
                    handle.unsubscribe(id);
                }
            }),
        );
        id_cell.set(Some(id));
        proxy.subscribe("n1", "content", ctx, later);

        assert_eq!(proxy.notify(&text_change("n1", "content", "a")), 2);
        assert_eq!(proxy.notify(&text_change("n1", "content", "ab")), 1);
        assert_eq!(first_calls.get(), 1);
        assert_eq!(later_calls.get(), 2);
        proxy.clear();
    }

    #[test]
    fn test_listener_removing_later_subscriber_skips_it() {
        let proxy = PathEventProxy::new("path");
        let ctx = ListenerContext::new();
        let victim_ctx = ListenerContext::new();
        let (victim_calls, victim) = counter();

        let handle = proxy.clone();
        proxy.subscribe(
            "n1",
            "content",
            ctx,
            listener(move |_| {
                handle.unsubscribe_context(victim_ctx);
            }),
        );
        proxy.subscribe("n1", "content", victim_ctx, victim);

        assert_eq!(proxy.notify(&text_change("n1", "content", "a")), 1);
        assert_eq!(victim_calls.get(), 0);
        proxy.clear();
    }

    #[test]
    fn test_subscribe_during_dispatch_waits_for_next_pass() {
        let proxy = PathEventProxy::new("path");
        let (added_calls, added) = counter();
        let handle = proxy.clone();
        let added_once = Rc::new(Cell::new(false));
        let added_flag = added_once.clone();

        proxy.subscribe(
            "n1",
            "content",
            ListenerContext::new(),
            listener(move |_| {
                if !added_flag.replace(true) {
                    handle.subscribe("n1", "content", ListenerContext::new(), added.clone());
                }
            }),
        );

        assert_eq!(proxy.notify(&text_change("n1", "content", "a")), 1);
        assert_eq!(added_calls.get(), 0);
        assert_eq!(proxy.notify(&text_change("n1", "content", "ab")), 2);
        assert_eq!(added_calls.get(), 1);
        proxy.clear();
    }

    #[test]
    fn test_double_unsubscribe_is_noop() {
        let proxy = PathEventProxy::new("path");
        let ctx = ListenerContext::new();
        let id = proxy.subscribe("n1", "content", ctx, listener(|_| {}));

        assert!(proxy.unsubscribe(id));
        assert!(!proxy.unsubscribe(id));
        assert_eq!(proxy.unsubscribe_context(ctx), 0);
        assert!(proxy.is_empty());
    }
}

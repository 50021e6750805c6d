//! Subscription Index
//!
//! Ordered subscriber lists keyed by `(node id, name)`, shared by the path
//! proxy (name = property) and the node-local hub (name = event name).
//!
//! Dispatch works on a snapshot of the list taken before any listener runs,
//! and each subscription carries a shared `active` flag. A listener may
//! therefore subscribe or unsubscribe (itself included) while a dispatch is in
//! progress: new subscriptions wait for the next dispatch, removed ones are
//! skipped for the rest of the current one.

use crate::events::event::same_listener;
use crate::events::{Listener, ListenerContext, NodeEvent, SubscriptionId};
use crate::models::NodeId;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// `(node id, name)` key of a subscriber list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct EventPath {
    pub(crate) node_id: NodeId,
    pub(crate) name: String,
}

impl EventPath {
    pub(crate) fn new(node_id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) context: ListenerContext,
    pub(crate) listener: Listener,
    active: Rc<Cell<bool>>,
}

impl Subscription {
    fn deactivate(&self) {
        self.active.set(false);
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// Invoke every still-active subscription of a snapshot, in order
pub(crate) fn dispatch(snapshot: &[Subscription], event: &NodeEvent) -> usize {
    let mut delivered = 0;
    for subscription in snapshot {
        if subscription.is_active() {
            (subscription.listener)(event);
            delivered += 1;
        }
    }
    delivered
}

#[derive(Default)]
pub(crate) struct SubscriptionIndex {
    by_path: HashMap<EventPath, Vec<Subscription>>,
    paths: HashMap<SubscriptionId, EventPath>,
}

impl SubscriptionIndex {
    pub(crate) fn add(
        &mut self,
        path: EventPath,
        context: ListenerContext,
        listener: Listener,
    ) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.by_path
            .entry(path.clone())
            .or_default()
            .push(Subscription {
                id,
                context,
                listener,
                active: Rc::new(Cell::new(true)),
            });
        self.paths.insert(id, path);
        id
    }

    pub(crate) fn snapshot(&self, path: &EventPath) -> Vec<Subscription> {
        self.by_path.get(path).cloned().unwrap_or_default()
    }

    pub(crate) fn count(&self, path: &EventPath) -> usize {
        self.by_path.get(path).map_or(0, Vec::len)
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }

    pub(crate) fn remove_id(&mut self, id: SubscriptionId) -> bool {
        let Some(path) = self.paths.remove(&id) else {
            return false;
        };
        if let Some(list) = self.by_path.get_mut(&path) {
            list.retain(|s| {
                if s.id == id {
                    s.deactivate();
                    false
                } else {
                    true
                }
            });
            if list.is_empty() {
                self.by_path.remove(&path);
            }
        }
        true
    }

    /// Remove subscriptions of `context`, optionally limited to one path and
    /// one listener
    pub(crate) fn remove_matching(
        &mut self,
        context: ListenerContext,
        path: Option<&EventPath>,
        listener: Option<&Listener>,
    ) -> usize {
        self.remove_where(|p, s| {
            s.context == context
                && path.map_or(true, |wanted| wanted == p)
                && listener.map_or(true, |l| same_listener(l, &s.listener))
        })
    }

    /// Remove every subscription on any path of `node_id`
    pub(crate) fn remove_node(&mut self, node_id: &str) -> usize {
        self.remove_where(|p, _| p.node_id == node_id)
    }

    /// Deactivate and drop everything, returning the dropped subscriptions
    pub(crate) fn take_all(&mut self) -> Vec<Subscription> {
        self.paths.clear();
        let all: Vec<Subscription> = self.by_path.drain().flat_map(|(_, list)| list).collect();
        for subscription in &all {
            subscription.deactivate();
        }
        all
    }

    pub(crate) fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&EventPath, &Subscription) -> bool,
    {
        let mut removed = Vec::new();
        for (path, list) in self.by_path.iter_mut() {
            list.retain(|s| {
                if predicate(path, s) {
                    s.deactivate();
                    removed.push(s.id);
                    false
                } else {
                    true
                }
            });
        }
        self.by_path.retain(|_, list| !list.is_empty());
        for id in &removed {
            self.paths.remove(id);
        }
        removed.len()
    }
}

//! Change Events
//!
//! Two notification channels share one subscription mechanism:
//!
//! - `PathEventProxy` - document-scoped, keyed by `(node id, property)`
//! - `LocalEventHub` - node-local events under arbitrary names
//!
//! Dispatch is synchronous and in subscription order. Both channels tolerate
//! listeners that subscribe or unsubscribe while being invoked.

mod event;
mod local;
mod path_proxy;
mod subscribers;

pub use event::{
    changed_event_name, listener, Change, EventKind, Listener, ListenerContext, NodeEvent,
    PropertyChange, SubscriptionId, CHANGED_SUFFIX, HIGHLIGHTED_EVENT,
};
pub use local::LocalEventHub;
pub use path_proxy::PathEventProxy;

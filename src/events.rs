//! Typed lifecycle event registry
//!
//! Consumers subscribe callbacks per [`EventKind`]; emitting an event
//! invokes the matching callbacks synchronously in registration order.
//! Events with no subscribers are dropped silently.

use crate::types::{Event, EventKind};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Callback invoked with emitted events
pub type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Per-kind subscriber lists
#[derive(Default)]
pub struct ObserverRegistry {
    subscribers: RwLock<HashMap<EventKind, Vec<EventCallback>>>,
}

impl ObserverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one event kind.
    ///
    /// Callbacks for the same kind fire in the order they were registered.
    pub fn subscribe(&self, kind: EventKind, callback: EventCallback) {
        if let Ok(mut map) = self.subscribers.write() {
            map.entry(kind).or_default().push(callback);
        }
    }

    /// Deliver an event to its subscribers
    pub fn emit(&self, event: &Event) {
        let Ok(map) = self.subscribers.read() else {
            tracing::warn!("event registry lock poisoned, dropping event");
            return;
        };
        if let Some(callbacks) = map.get(&event.kind()) {
            for callback in callbacks {
                callback(event);
            }
        }
    }

    /// Number of subscribers for a kind (mainly for introspection)
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .read()
            .map(|map| map.get(&kind).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<(EventKind, usize)> = self
            .subscribers
            .read()
            .map(|map| map.iter().map(|(k, v)| (*k, v.len())).collect())
            .unwrap_or_default();
        f.debug_struct("ObserverRegistry")
            .field("subscribers", &counts)
            .finish()
    }
}

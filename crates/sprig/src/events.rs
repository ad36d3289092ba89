//! Event listener registry for host nodes.
//!
//! Listeners are keyed by a process-unique [`EventHandlerId`] and dispatched
//! by node and event name. Dispatch bubbles from the target toward the root.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dom::NodeId;

/// Unique identifier for an event handler.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EventHandlerId(pub usize);

impl std::fmt::Display for EventHandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event delivered to listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event name, e.g. `"input"` or `"click"`.
    pub name: String,
    /// The node the event was dispatched on.
    pub target: NodeId,
    /// The node whose listener is running.
    pub current_target: NodeId,
    /// Payload carried by input-like events.
    pub value: Option<String>,
}

/// Type alias for event handler callbacks.
pub type EventCallback = Rc<dyn Fn(&Event) + 'static>;

/// Global counter for generating unique event handler IDs.
static NEXT_HANDLER_ID: AtomicUsize = AtomicUsize::new(0);

/// Generate a new unique event handler ID.
pub fn next_handler_id() -> EventHandlerId {
    EventHandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst))
}

struct Listener {
    node: NodeId,
    event: String,
    callback: EventCallback,
}

/// Registry that maps event handler IDs to listeners.
#[derive(Default)]
pub struct EventRegistry {
    // Ordered by id, i.e. by registration order
    handlers: BTreeMap<EventHandlerId, Listener>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and return its ID.
    pub fn register(
        &mut self,
        node: NodeId,
        event: impl Into<String>,
        callback: EventCallback,
    ) -> EventHandlerId {
        let id = next_handler_id();
        self.handlers.insert(
            id,
            Listener {
                node,
                event: event.into(),
                callback,
            },
        );
        id
    }

    pub fn remove(&mut self, id: EventHandlerId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    /// Callbacks registered on `node` for `event`, in registration order.
    pub fn listeners(&self, node: NodeId, event: &str) -> Vec<EventCallback> {
        self.handlers
            .values()
            .filter(|listener| listener.node == node && listener.event == event)
            .map(|listener| Rc::clone(&listener.callback))
            .collect()
    }

    /// Get the number of registered handlers (for debugging).
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = EventRegistry::new();
        let node = NodeId::from(4);
        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();

        registry.register(node, "click", Rc::new(move |_: &Event| called_clone.set(true)));

        let listeners = registry.listeners(node, "click");
        assert_eq!(listeners.len(), 1);
        assert!(registry.listeners(node, "input").is_empty());

        let event = Event {
            name: "click".into(),
            target: node,
            current_target: node,
            value: None,
        };
        listeners[0](&event);
        assert!(called.get());
    }

    #[test]
    fn test_remove_handler() {
        let mut registry = EventRegistry::new();
        let id = registry.register(NodeId::from(1), "click", Rc::new(|_: &Event| {}));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn handler_ids_are_increasing() {
        let a = next_handler_id();
        let b = next_handler_id();
        assert!(b > a);
    }
}

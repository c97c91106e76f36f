//! # formset-rs-events
//!
//! Event dispatch for the formset-rs framework. A button element owns an
//! [`EventTarget`]; the `emit()` and `activate()` actions, and navigation
//! requests, are delivered to the host page as [`CustomEvent`]s on it.
//!
//! ## Usage
//!
//! ```
//! use formset_rs_events::{CustomEvent, EventTarget};
//! use std::sync::Arc;
//!
//! let target = EventTarget::new();
//!
//! target.add_event_listener("saved", "logger", Arc::new(|event: &CustomEvent| {
//!     println!("saved: {}", event.detail);
//! }));
//!
//! let delivered = target.dispatch_event(&CustomEvent::new("saved"));
//! assert_eq!(delivered, 1);
//! ```

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Listener type that receives every event regardless of its type.
pub const ANY_EVENT: &str = "*";

/// Event type used for navigation requests (`proceed()`, `reload()`).
pub const NAVIGATE_EVENT: &str = "navigate";

/// An event dispatched from an element, carrying an optional JSON detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    /// The event type, e.g. `"activate"` or a user-chosen name.
    pub event_type: String,
    /// Payload attached to the event; `null` when none was given.
    pub detail: serde_json::Value,
}

impl CustomEvent {
    /// Creates an event without detail.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: serde_json::Value::Null,
        }
    }

    /// Creates an event with the given detail.
    pub fn with_detail(event_type: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            detail,
        }
    }

    /// Creates a navigation request to `url`.
    pub fn navigate(url: &str) -> Self {
        Self::with_detail(NAVIGATE_EVENT, serde_json::json!({ "url": url }))
    }

    /// Returns the target URL if this is a navigation request.
    pub fn navigation_url(&self) -> Option<&str> {
        if self.event_type == NAVIGATE_EVENT {
            self.detail.get("url").and_then(serde_json::Value::as_str)
        } else {
            None
        }
    }
}

/// The type signature for an event listener callback.
///
/// Listeners must be `Send + Sync` so that events can be dispatched from any
/// task.
pub type EventListener = Arc<dyn Fn(&CustomEvent) + Send + Sync>;

struct Registration {
    event_type: String,
    listener_id: String,
    callback: EventListener,
}

/// A target that listeners can subscribe to and events can be dispatched on.
///
/// Listeners are called in the order they were added. A listener registered
/// for [`ANY_EVENT`] receives every event.
#[derive(Default)]
pub struct EventTarget {
    listeners: RwLock<Vec<Registration>>,
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

impl EventTarget {
    /// Creates a target with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener for `event_type`.
    ///
    /// If a listener with the same ID is already registered for this type it
    /// is replaced in place, keeping its position in the call order.
    pub fn add_event_listener(
        &self,
        event_type: impl Into<String>,
        listener_id: impl Into<String>,
        callback: EventListener,
    ) {
        let event_type = event_type.into();
        let listener_id = listener_id.into();
        let mut listeners = self.listeners.write().expect("event target lock poisoned");

        if let Some(entry) = listeners
            .iter_mut()
            .find(|r| r.event_type == event_type && r.listener_id == listener_id)
        {
            entry.callback = callback;
        } else {
            listeners.push(Registration {
                event_type,
                listener_id,
                callback,
            });
        }
    }

    /// Removes the listener with the given ID for `event_type`.
    ///
    /// Returns `true` if a listener was found and removed.
    pub fn remove_event_listener(&self, event_type: &str, listener_id: &str) -> bool {
        let mut listeners = self.listeners.write().expect("event target lock poisoned");
        let len_before = listeners.len();
        listeners.retain(|r| !(r.event_type == event_type && r.listener_id == listener_id));
        listeners.len() < len_before
    }

    /// Dispatches an event to every matching listener.
    ///
    /// Returns the number of listeners invoked. Listeners run outside the
    /// internal lock, so they may add or remove listeners themselves.
    pub fn dispatch_event(&self, event: &CustomEvent) -> usize {
        let matching: Vec<EventListener> = {
            let listeners = self.listeners.read().expect("event target lock poisoned");
            listeners
                .iter()
                .filter(|r| r.event_type == event.event_type || r.event_type == ANY_EVENT)
                .map(|r| Arc::clone(&r.callback))
                .collect()
        };

        tracing::trace!(
            event = %event.event_type,
            listeners = matching.len(),
            "dispatching event"
        );

        for callback in &matching {
            callback(event);
        }
        matching.len()
    }

    /// Returns the number of listeners registered for exactly `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .read()
            .expect("event target lock poisoned")
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }

    fn total_listeners(&self) -> usize {
        self.listeners.read().map_or(0, |l| l.len())
    }
}

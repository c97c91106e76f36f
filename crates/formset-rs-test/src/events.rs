//! Event capture for assertions.
//!
//! [`EventLog`] listens on a [`ButtonElement`] and keeps every event it sees,
//! like an outbox for the custom events a chain dispatches.

use std::sync::{Arc, Mutex};

use formset_rs_actions::element::ButtonElement;
use formset_rs_events::{CustomEvent, ANY_EVENT, NAVIGATE_EVENT};

const LISTENER_ID: &str = "formset_rs_test::EventLog";

/// Captured events, shared with the listener that records them.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<CustomEvent>>>,
}

impl EventLog {
    /// Starts recording every event dispatched from `element`.
    pub fn attach(element: &ButtonElement) -> Self {
        Self::attach_to(element, ANY_EVENT)
    }

    /// Starts recording events of type `event_type` dispatched from `element`.
    pub fn attach_to(element: &ButtonElement, event_type: &str) -> Self {
        let log = Self::default();
        let events = Arc::clone(&log.events);
        element.events().add_event_listener(
            event_type,
            LISTENER_ID,
            Arc::new(move |event: &CustomEvent| {
                events
                    .lock()
                    .expect("EventLog lock poisoned")
                    .push(event.clone());
            }),
        );
        log
    }

    /// All captured events, in dispatch order.
    pub fn events(&self) -> Vec<CustomEvent> {
        self.events.lock().expect("EventLog lock poisoned").clone()
    }

    /// The types of all captured events.
    pub fn types(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event_type).collect()
    }

    /// The URLs of captured navigations.
    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter(|e| e.event_type == NAVIGATE_EVENT)
            .filter_map(|e| e.navigation_url().map(str::to_string))
            .collect()
    }

    /// Number of captured events.
    pub fn len(&self) -> usize {
        self.events.lock().expect("EventLog lock poisoned").len()
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Asserts that an event of `event_type` was captured.
    ///
    /// # Panics
    ///
    /// Panics if no such event was dispatched.
    pub fn assert_dispatched(&self, event_type: &str) {
        let types = self.types();
        assert!(
            types.iter().any(|t| t == event_type),
            "No '{event_type}' event was dispatched. Dispatched: {types:?}"
        );
    }
}

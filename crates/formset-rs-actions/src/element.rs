//! The button element a controller acts on.
//!
//! [`ButtonElement`] models the parts of a DOM `<button>` the action chain
//! touches: its CSS class list, its disabled flag, the page location it may
//! navigate away from, and an [`EventTarget`] for the events it emits.

use std::sync::RwLock;

use formset_rs_events::{CustomEvent, EventTarget};

#[derive(Debug, Default)]
struct ElementState {
    classes: Vec<String>,
    disabled: bool,
    location: String,
}

/// A button element shared between its controller and the host page.
#[derive(Debug)]
pub struct ButtonElement {
    id: String,
    state: RwLock<ElementState>,
    events: EventTarget,
}

impl ButtonElement {
    /// Creates an enabled element without classes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(ElementState::default()),
            events: EventTarget::new(),
        }
    }

    /// Sets the initial `class` attribute.
    #[must_use]
    pub fn with_class_name(self, class_name: &str) -> Self {
        self.set_class_name(class_name);
        self
    }

    /// Sets the location of the page the element lives on.
    #[must_use]
    pub fn with_location(self, location: impl Into<String>) -> Self {
        self.write().location = location.into();
        self
    }

    /// The element's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ElementState> {
        self.state.read().expect("element state lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ElementState> {
        self.state.write().expect("element state lock poisoned")
    }

    // ── Classes ──────────────────────────────────────────────────────

    /// The `class` attribute: class names joined by single spaces.
    pub fn class_name(&self) -> String {
        self.read().classes.join(" ")
    }

    /// Replaces all classes with those in `class_name`, dropping duplicates.
    pub fn set_class_name(&self, class_name: &str) {
        let mut classes: Vec<String> = Vec::new();
        for token in class_name.split_whitespace() {
            if !classes.iter().any(|c| c == token) {
                classes.push(token.to_string());
            }
        }
        self.write().classes = classes;
    }

    /// Returns `true` if the element carries `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.read().classes.iter().any(|c| c == class)
    }

    /// Adds `class` at the end unless already present.
    pub fn add_class(&self, class: &str) {
        let mut state = self.write();
        if !state.classes.iter().any(|c| c == class) {
            state.classes.push(class.to_string());
        }
    }

    /// Removes `class` if present.
    pub fn remove_class(&self, class: &str) {
        self.write().classes.retain(|c| c != class);
    }

    /// Adds `class` if absent, removes it otherwise. Returns whether the
    /// element carries the class afterwards.
    pub fn toggle_class(&self, class: &str) -> bool {
        let mut state = self.write();
        if let Some(index) = state.classes.iter().position(|c| c == class) {
            state.classes.remove(index);
            false
        } else {
            state.classes.push(class.to_string());
            true
        }
    }

    // ── Disabled state ───────────────────────────────────────────────

    /// Whether the element is disabled.
    pub fn is_disabled(&self) -> bool {
        self.read().disabled
    }

    /// Sets the disabled flag.
    pub fn set_disabled(&self, disabled: bool) {
        self.write().disabled = disabled;
    }

    // ── Location and events ──────────────────────────────────────────

    /// The location of the page, as last set or navigated to.
    pub fn location(&self) -> String {
        self.read().location.clone()
    }

    /// Navigates the page to `url` and announces it with a `navigate` event.
    pub fn navigate(&self, url: &str) {
        self.write().location = url.to_string();
        tracing::debug!(element = %self.id, url, "navigating");
        self.events.dispatch_event(&CustomEvent::navigate(url));
    }

    /// Dispatches `event` from this element; returns the listeners reached.
    pub fn dispatch_event(&self, event: &CustomEvent) -> usize {
        self.events.dispatch_event(event)
    }

    /// The element's event target, for adding listeners.
    pub const fn events(&self) -> &EventTarget {
        &self.events
    }
}

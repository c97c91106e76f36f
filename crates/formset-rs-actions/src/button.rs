//! The button controller.
//!
//! A [`Button`] binds a [`ButtonElement`] to the [`Formset`] it belongs to
//! and to the chains compiled from its action expression. Activating it runs
//! the chains; aborting it cancels a pending delay and the formset's
//! in-flight request.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use formset_rs_actions::{Button, ButtonElement, Formset};
//!
//! async fn click(formset: Arc<dyn Formset>) {
//!     let element = Arc::new(ButtonElement::new("save").with_class_name("btn"));
//!     let button = Button::new(element, formset, "disable -> submit -> proceed !~ enable")
//!         .expect("valid expression");
//!     let activation = button.activate().await;
//!     println!("{:?}", activation);
//! }
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use formset_rs_core::error::{FormsetError, FormsetResult};
use formset_rs_core::logging::activation_span;
use formset_rs_core::settings::{ButtonSettings, Reentrancy, SETTINGS};
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::builder::{build, ResolvedChains};
use crate::element::ButtonElement;
use crate::engine::{execute, Activation};
use crate::formset::Formset;
use crate::parser::parse;
use crate::registry::{ActionRegistry, StepFailure};

#[derive(Debug)]
struct PendingTimer {
    id: u64,
    cancel: oneshot::Sender<()>,
}

/// What a step can reach while it runs.
pub struct ButtonContext {
    element: Arc<ButtonElement>,
    formset: Arc<dyn Formset>,
    settings: ButtonSettings,
    initial_class: String,
    timer: Mutex<Option<PendingTimer>>,
    timer_ids: AtomicU64,
}

impl ButtonContext {
    /// Snapshots the element's current classes as the state to restore.
    pub fn new(
        element: Arc<ButtonElement>,
        formset: Arc<dyn Formset>,
        settings: ButtonSettings,
    ) -> Self {
        let initial_class = element.class_name();
        Self {
            element,
            formset,
            settings,
            initial_class,
            timer: Mutex::new(None),
            timer_ids: AtomicU64::new(0),
        }
    }

    /// The element the button controls.
    pub fn element(&self) -> &ButtonElement {
        &self.element
    }

    /// The formset the button belongs to.
    pub fn formset(&self) -> &dyn Formset {
        self.formset.as_ref()
    }

    /// The button's settings.
    pub const fn settings(&self) -> &ButtonSettings {
        &self.settings
    }

    /// The class string restored after each activation.
    pub fn initial_class(&self) -> &str {
        &self.initial_class
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<PendingTimer>> {
        self.timer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Sleeps for `duration` unless [`cancel_timer`](Self::cancel_timer)
    /// is called first, in which case the step fails as aborted.
    ///
    /// Only the most recently started sleep is cancellable.
    pub async fn sleep(&self, duration: Duration) -> Result<(), StepFailure> {
        let (cancel, cancelled) = oneshot::channel();
        let id = self.timer_ids.fetch_add(1, Ordering::Relaxed) + 1;
        *self.lock_timer() = Some(PendingTimer { id, cancel });

        tokio::select! {
            () = tokio::time::sleep(duration) => {
                let mut timer = self.lock_timer();
                if timer.as_ref().is_some_and(|t| t.id == id) {
                    *timer = None;
                }
                Ok(())
            }
            Ok(()) = cancelled => {
                tracing::debug!(element = %self.element.id(), "delay cancelled");
                Err(StepFailure::Aborted)
            }
        }
    }

    /// Cancels the pending sleep. Returns `true` if one was cancelled.
    pub fn cancel_timer(&self) -> bool {
        self.lock_timer()
            .take()
            .is_some_and(|timer| timer.cancel.send(()).is_ok())
    }

    /// Puts the element back to its pre-activation look and enables it.
    pub(crate) fn restore(&self) {
        self.element.set_class_name(&self.initial_class);
        self.element.set_disabled(false);
    }
}

impl std::fmt::Debug for ButtonContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ButtonContext")
            .field("element", &self.element.id())
            .field("settings", &self.settings)
            .field("initial_class", &self.initial_class)
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter when an activation ends.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A button with a compiled action expression.
#[derive(Debug)]
pub struct Button {
    context: ButtonContext,
    chains: ResolvedChains,
    in_flight: AtomicUsize,
    activations: AtomicU64,
}

impl Button {
    /// Compiles `expression` with the built-in actions and the global
    /// button settings.
    ///
    /// # Errors
    ///
    /// Syntax, name resolution and argument errors, wrapped with the
    /// element's id.
    pub fn new(
        element: Arc<ButtonElement>,
        formset: Arc<dyn Formset>,
        expression: &str,
    ) -> FormsetResult<Self> {
        Self::with_registry(
            element,
            formset,
            expression,
            &ActionRegistry::with_builtins(),
            SETTINGS.get().button.clone(),
        )
    }

    /// Compiles `expression` against `registry`.
    pub fn with_registry(
        element: Arc<ButtonElement>,
        formset: Arc<dyn Formset>,
        expression: &str,
        registry: &ActionRegistry,
        settings: ButtonSettings,
    ) -> FormsetResult<Self> {
        let compiled = parse(expression)
            .map_err(FormsetError::from)
            .and_then(|parsed| build(&parsed, registry));
        let chains = match compiled {
            Ok(chains) => chains,
            Err(error) => {
                tracing::warn!(element = %element.id(), %error, "invalid action expression");
                return Err(error.in_element(element.id()));
            }
        };

        Ok(Self {
            context: ButtonContext::new(element, formset, settings),
            chains,
            in_flight: AtomicUsize::new(0),
            activations: AtomicU64::new(0),
        })
    }

    /// The element the button controls.
    pub fn element(&self) -> &ButtonElement {
        self.context.element()
    }

    /// The compiled chains.
    pub const fn chains(&self) -> &ResolvedChains {
        &self.chains
    }

    /// The context steps run in.
    pub const fn context(&self) -> &ButtonContext {
        &self.context
    }

    /// Returns `true` while an activation has not settled.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// Runs the button's chains once.
    ///
    /// With [`Reentrancy::Ignore`], an activation started while another is
    /// pending returns [`Activation::Skipped`] without touching anything.
    pub async fn activate(&self) -> Activation {
        let seq = self.activations.fetch_add(1, Ordering::Relaxed) + 1;
        let span = activation_span(self.element().id(), seq);

        match self.context.settings.reentrancy {
            Reentrancy::Ignore => {
                if self
                    .in_flight
                    .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    span.in_scope(|| tracing::debug!("skipping re-entrant activation"));
                    return Activation::Skipped;
                }
            }
            Reentrancy::Allow => {
                self.in_flight.fetch_add(1, Ordering::AcqRel);
            }
        }
        let _in_flight = InFlight(&self.in_flight);

        execute(&self.chains, &self.context).instrument(span).await
    }

    /// Aborts the running action: cancels a pending delay and the formset's
    /// in-flight request. Calling it with nothing running is harmless.
    pub fn abort_action(&self) {
        if self.context.cancel_timer() {
            tracing::debug!(element = %self.element().id(), "aborted pending delay");
        }
        self.context.formset().abort();
    }

    /// Follows the formset's validity when auto-disable is enabled.
    pub fn auto_disable(&self, form_is_valid: bool) {
        if self.context.settings.auto_disable {
            self.element().set_disabled(!form_is_valid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formset::Response;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Silent {
        aborts: AtomicUsize,
    }

    #[async_trait]
    impl Formset for Silent {
        async fn submit(
            &self,
            _extra_data: Option<serde_json::Value>,
        ) -> Result<Option<Response>, FormsetError> {
            Ok(Some(Response::ok(serde_json::json!({}))))
        }

        fn reset_to_initial(&self) {}

        fn abort(&self) {
            self.aborts.fetch_add(1, Ordering::SeqCst);
        }

        fn get_data_value(&self, _path: &str) -> Option<serde_json::Value> {
            None
        }
    }

    fn button(expression: &str, settings: ButtonSettings) -> FormsetResult<Button> {
        Button::with_registry(
            Arc::new(ButtonElement::new("btn").with_class_name("button")),
            Arc::new(Silent::default()),
            expression,
            &ActionRegistry::with_builtins(),
            settings,
        )
    }

    #[test]
    fn test_construction_error_names_element() {
        let err = button("submit -> explode", ButtonSettings::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error in attribute 'click' of button 'btn': Unknown action: explode"
        );
        assert!(err.is_setup_error());
    }

    #[test]
    fn test_syntax_error_names_element() {
        let err = button("submit ->", ButtonSettings::default()).unwrap_err();
        assert!(err.to_string().starts_with("Error in attribute 'click' of button 'btn': Syntax error"));
    }

    #[test]
    fn test_auto_disable_follows_validity() {
        let settings = ButtonSettings {
            auto_disable: true,
            ..ButtonSettings::default()
        };
        let b = button("submit", settings).unwrap();
        b.auto_disable(false);
        assert!(b.element().is_disabled());
        b.auto_disable(true);
        assert!(!b.element().is_disabled());
    }

    #[test]
    fn test_auto_disable_off_by_default() {
        let b = button("submit", ButtonSettings::default()).unwrap();
        b.auto_disable(false);
        assert!(!b.element().is_disabled());
    }

    #[test]
    fn test_abort_without_running_action() {
        let b = button("submit", ButtonSettings::default()).unwrap();
        assert!(!b.context().cancel_timer());
        b.abort_action();
        b.abort_action();
        assert!(!b.is_running());
    }

    #[tokio::test]
    async fn test_activation_restores_classes() {
        let b = button(
            "addClass('busy') -> disable -> submit",
            ButtonSettings::default(),
        )
        .unwrap();
        let activation = b.activate().await;
        assert!(activation.is_fulfilled());
        assert_eq!(b.element().class_name(), "button");
        assert!(!b.element().is_disabled());
        assert!(!b.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_cancels_delay() {
        let b = button("delay(10000) -> addClass('late')", ButtonSettings::default()).unwrap();
        let (activation, ()) = tokio::join!(b.activate(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            b.abort_action();
        });
        assert_eq!(activation, Activation::Aborted);
        assert!(!b.element().has_class("late"));
    }
}

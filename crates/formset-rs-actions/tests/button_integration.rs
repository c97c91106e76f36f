//! Integration tests for buttons: parsing, building and running chains
//! against recording and router-backed formsets.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use formset_rs_actions::{
    parse, Activation, ActionRegistry, ActionStep, BoundArgument, Button, ButtonContext,
    ButtonElement, Formset, Rejection, StepFailure, StepInput, StepResult,
};
use formset_rs_core::error::FormsetError;
use formset_rs_core::settings::{ButtonSettings, Reentrancy};
use formset_rs_events::CustomEvent;
use formset_rs_test::{EventLog, FormsetCall, RecordingFormset, Reply, RouterFormset};

// ============================================================================
// Helpers
// ============================================================================

type Trace = Arc<Mutex<Vec<String>>>;

/// Appends its label to a shared trace; rejects when asked to.
#[derive(Debug)]
struct Mark {
    label: String,
    reject: bool,
    trace: Trace,
}

#[async_trait]
impl ActionStep for Mark {
    async fn run(&self, _ctx: &ButtonContext, input: StepInput) -> StepResult {
        self.trace.lock().unwrap().push(self.label.clone());
        if self.reject {
            Err(StepFailure::error(format!("{} rejected", self.label)))
        } else {
            Ok(input)
        }
    }
}

/// Builtins plus `mark('label')` and `fail('label')`.
fn tracing_registry(trace: &Trace) -> ActionRegistry {
    let mut registry = ActionRegistry::with_builtins();
    for (name, reject) in [("mark", false), ("fail", true)] {
        let trace = Arc::clone(trace);
        registry.register(
            name,
            Arc::new(move |args: &[BoundArgument]| {
                let label = match args {
                    [label] => label.as_str().unwrap_or_default().to_string(),
                    _ => {
                        return Err(FormsetError::InvalidArguments {
                            action: name.to_string(),
                            reason: "expected a label".to_string(),
                        })
                    }
                };
                Ok(Box::new(Mark {
                    label,
                    reject,
                    trace: Arc::clone(&trace),
                }) as Box<dyn ActionStep>)
            }),
        );
    }
    registry
}

fn element() -> Arc<ButtonElement> {
    Arc::new(
        ButtonElement::new("submit-button")
            .with_class_name("btn btn-primary")
            .with_location("/form/"),
    )
}

fn button_with(
    formset: Arc<dyn Formset>,
    expression: &str,
    registry: &ActionRegistry,
    settings: ButtonSettings,
) -> Button {
    Button::with_registry(element(), formset, expression, registry, settings).unwrap()
}

fn button(formset: &RecordingFormset, expression: &str) -> Button {
    button_with(
        Arc::new(formset.clone()),
        expression,
        &ActionRegistry::with_builtins(),
        ButtonSettings::default(),
    )
}

// ============================================================================
// Parsing shape
// ============================================================================

#[test]
fn test_chain_lengths_follow_arrows() {
    for (input, success, reject) in [
        ("a", 1, 0),
        ("a -> b -> c", 3, 0),
        ("a !~ b", 1, 1),
        ("a -> b !~ c -> d -> e", 2, 3),
    ] {
        let result = parse(input).unwrap();
        assert_eq!(result.success_chain.len(), success, "{input}");
        assert_eq!(result.reject_chain.len(), reject, "{input}");
    }
}

#[test]
fn test_literal_scenario_two_chains() {
    let result = parse("action1 -> action2 !~ action3").unwrap();
    assert_eq!(result.to_string(), "action1() -> action2() !~ action3()");
}

#[test]
fn test_literal_scenario_single_call() {
    let result = parse("addClass('x')").unwrap();
    assert_eq!(result.success_chain.len(), 1);
    assert_eq!(result.success_chain[0].name, "addClass");
    assert!(result.reject_chain.is_empty());
}

// ============================================================================
// Construction
// ============================================================================

#[tokio::test]
async fn test_unknown_name_fails_before_any_step() {
    let trace: Trace = Arc::default();
    let registry = tracing_registry(&trace);
    let formset = RecordingFormset::new();

    let result = Button::with_registry(
        element(),
        Arc::new(formset.clone()),
        "mark('one') -> submit -> explode()",
        &registry,
        ButtonSettings::default(),
    );

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Unknown action: explode"));
    assert!(trace.lock().unwrap().is_empty());
    assert!(formset.calls().is_empty());
}

#[test]
fn test_syntax_error_reports_position() {
    let err = Button::new(
        element(),
        Arc::new(RecordingFormset::new()),
        "submit -> ",
    )
    .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Error in attribute 'click' of button 'submit-button':"));
    assert!(message.contains("line 1, column 11"));
    assert!(message.ends_with("but end of input found."));
}

#[test]
fn test_broken_button_does_not_affect_sibling() {
    let formset = RecordingFormset::new();
    let broken = Button::new(element(), Arc::new(formset.clone()), "submit(");
    let sibling = Button::new(element(), Arc::new(formset), "submit");
    assert!(broken.is_err());
    assert!(sibling.is_ok());
}

// ============================================================================
// Routing between chains
// ============================================================================

#[tokio::test]
async fn test_second_of_three_rejects_then_reject_chain_runs() {
    let trace: Trace = Arc::default();
    let registry = tracing_registry(&trace);
    let b = button_with(
        Arc::new(RecordingFormset::new()),
        "mark('s1') -> fail('s2') -> mark('s3') !~ mark('r1') -> mark('r2')",
        &registry,
        ButtonSettings::default(),
    );

    let activation = b.activate().await;

    assert_eq!(activation, Activation::Recovered(None));
    assert_eq!(*trace.lock().unwrap(), vec!["s1", "s2", "r1", "r2"]);
}

#[tokio::test]
async fn test_rejection_without_reject_chain_settles_rejected() {
    let trace: Trace = Arc::default();
    let registry = tracing_registry(&trace);
    let b = button_with(
        Arc::new(RecordingFormset::new()),
        "addClass('busy') -> fail('s1') -> mark('s2')",
        &registry,
        ButtonSettings::default(),
    );

    let activation = b.activate().await;

    assert_eq!(
        activation,
        Activation::Rejected(Rejection::Error("s1 rejected".to_string()))
    );
    assert_eq!(*trace.lock().unwrap(), vec!["s1"]);
    assert_eq!(b.element().class_name(), "btn btn-primary");
}

#[tokio::test]
async fn test_reject_chain_failure_settles_rejected() {
    let trace: Trace = Arc::default();
    let registry = tracing_registry(&trace);
    let b = button_with(
        Arc::new(RecordingFormset::new()),
        "fail('s1') !~ fail('r1') -> mark('r2')",
        &registry,
        ButtonSettings::default(),
    );

    let activation = b.activate().await;

    assert_eq!(
        activation,
        Activation::Rejected(Rejection::Error("r1 rejected".to_string()))
    );
    assert_eq!(*trace.lock().unwrap(), vec!["s1", "r1"]);
}

#[tokio::test]
async fn test_cleanup_restores_after_recovery() {
    let formset = RecordingFormset::new().reply(Reply::status(400, serde_json::json!({})));
    let b = button(&formset, "disable -> addClass('busy') -> submit !~ addClass('failed')");

    let activation = b.activate().await;

    assert!(matches!(activation, Activation::Recovered(Some(_))));
    assert_eq!(b.element().class_name(), "btn btn-primary");
    assert!(!b.element().is_disabled());
    assert!(!b.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_activation_still_restores() {
    let b = Arc::new(button(
        &RecordingFormset::new(),
        "disable -> addClass('busy') -> delay(5000)",
    ));

    let runner = Arc::clone(&b);
    let handle = tokio::spawn(async move { runner.activate().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(b.element().has_class("busy"));

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
    assert_eq!(b.element().class_name(), "btn btn-primary");
    assert!(!b.element().is_disabled());
    assert!(!b.is_running());
}

// ============================================================================
// disable -> submit -> proceed('/ok/') !~ enable
// ============================================================================

const SCENARIO: &str = "disable() -> submit() -> proceed('/ok/') !~ enable()";

#[tokio::test]
async fn test_scenario_ok_navigates() {
    let formset = RecordingFormset::new().reply(Reply::ok(serde_json::json!({})));
    let b = button(&formset, SCENARIO);
    let log = EventLog::attach(b.element());

    let activation = b.activate().await;

    assert!(activation.is_fulfilled());
    assert_eq!(log.navigations(), vec!["/ok/"]);
    assert_eq!(b.element().location(), "/ok/");
    assert!(!b.element().is_disabled());
}

#[tokio::test]
async fn test_scenario_success_url_wins_over_fallback() {
    let formset = RecordingFormset::new()
        .reply(Reply::ok(serde_json::json!({"success_url": "/thanks/"})));
    let b = button(&formset, SCENARIO);
    let log = EventLog::attach(b.element());

    b.activate().await;

    assert_eq!(log.navigations(), vec!["/thanks/"]);
}

#[tokio::test]
async fn test_scenario_error_status_runs_enable_and_restores() {
    let formset = RecordingFormset::new().reply(Reply::status(
        422,
        serde_json::json!({"email": ["Enter a valid email address."]}),
    ));
    let b = button(&formset, SCENARIO);
    let log = EventLog::attach(b.element());

    let activation = b.activate().await;

    match activation {
        Activation::Recovered(Some(response)) => {
            assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        }
        other => panic!("expected recovered activation, got {other:?}"),
    }
    assert!(log.navigations().is_empty());
    assert!(!b.element().is_disabled());
    assert_eq!(b.element().class_name(), "btn btn-primary");
    assert_eq!(b.element().location(), "/form/");
}

#[tokio::test]
async fn test_scenario_created_is_not_ok() {
    let formset = RecordingFormset::new().reply(Reply::status(201, serde_json::json!({})));
    let b = button(&formset, SCENARIO);
    let log = EventLog::attach(b.element());

    let activation = b.activate().await;

    assert!(matches!(activation, Activation::Recovered(_)));
    assert!(log.navigations().is_empty());
}

#[tokio::test]
async fn test_scenario_invalid_form_sends_nothing() {
    let formset = RecordingFormset::new().reply(Reply::Nothing);
    let b = button(&formset, SCENARIO);

    let activation = b.activate().await;

    assert_eq!(activation, Activation::Recovered(None));
    assert_eq!(formset.submissions(), vec![None]);
}

#[tokio::test]
async fn test_scenario_submission_error_is_a_rejection() {
    let formset = RecordingFormset::new().reply(Reply::Fail("connection refused".into()));
    let b = button(&formset, "submit");

    let activation = b.activate().await;

    assert_eq!(
        activation,
        Activation::Rejected(Rejection::Error(
            "Submission failed: connection refused".to_string()
        ))
    );
}

#[tokio::test]
async fn test_proceed_without_target_rejects() {
    let formset = RecordingFormset::new().reply(Reply::ok(serde_json::json!({})));
    let b = button(&formset, "submit -> proceed");

    let activation = b.activate().await;

    assert_eq!(
        activation,
        Activation::Rejected(Rejection::Error("Unable to proceed to next page".to_string()))
    );
}

// ============================================================================
// Other built-ins
// ============================================================================

#[tokio::test]
async fn test_submit_passes_evaluated_data() {
    let formset = RecordingFormset::new()
        .with_data(serde_json::json!({"customer": {"id": 17}}));
    let b = button(&formset, "submit({ customer: customer.id, draft: true })");

    b.activate().await;

    assert_eq!(
        formset.submissions(),
        vec![Some(serde_json::json!({"customer": 17, "draft": true}))]
    );
}

#[tokio::test]
async fn test_data_value_read_at_activation() {
    let formset = RecordingFormset::new().with_data(serde_json::json!({"n": 1}));
    let b = button(&formset, "emit('counted', n)");
    let log = EventLog::attach_to(b.element(), "counted");

    b.activate().await;
    formset.set_data(serde_json::json!({"n": 2}));
    b.activate().await;

    let details: Vec<serde_json::Value> = log.events().into_iter().map(|e| e.detail).collect();
    assert_eq!(details, vec![serde_json::json!(1), serde_json::json!(2)]);
}

#[tokio::test]
async fn test_emit_activate_and_prefill() {
    let formset = RecordingFormset::new().with_data(serde_json::json!({"row": {"pk": 3}}));
    let b = button(
        &formset,
        "emit('picked', prefill(row)) -> activate('edit', row.pk)",
    );
    let log = EventLog::attach(b.element());

    b.activate().await;

    let events = log.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "picked");
    assert_eq!(events[0].detail, serde_json::json!({"prefill": {"pk": 3}}));
    assert_eq!(events[1].event_type, "activate");
    assert_eq!(events[1].detail, serde_json::json!(["edit", 3]));
}

#[tokio::test]
async fn test_reset_and_clear_errors_delegate() {
    let formset = RecordingFormset::new();
    let b = button(&formset, "clearErrors -> reset -> noop -> intercept");

    let activation = b.activate().await;

    assert!(activation.is_fulfilled());
    assert_eq!(formset.calls(), vec![FormsetCall::ClearErrors, FormsetCall::Reset]);
}

#[tokio::test]
async fn test_reload_navigates_to_location() {
    let b = button(&RecordingFormset::new(), "reload");
    let log = EventLog::attach(b.element());

    b.activate().await;

    assert_eq!(log.navigations(), vec!["/form/"]);
}

#[tokio::test]
async fn test_class_changes_are_visible_during_chain_only() {
    let element = element();
    let seen = Arc::new(Mutex::new(String::new()));
    let s = Arc::clone(&seen);
    let weak = Arc::downgrade(&element);
    element.events().add_event_listener(
        "peek",
        "observer",
        Arc::new(move |_event: &CustomEvent| {
            if let Some(element) = weak.upgrade() {
                *s.lock().unwrap() = element.class_name();
            }
        }),
    );
    let b = Button::with_registry(
        Arc::clone(&element),
        Arc::new(RecordingFormset::new()),
        "toggleClass('btn') -> addClass('busy') -> removeClass('btn-primary') -> emit('peek')",
        &ActionRegistry::with_builtins(),
        ButtonSettings::default(),
    )
    .unwrap();

    b.activate().await;

    assert_eq!(*seen.lock().unwrap(), "busy");
    assert_eq!(element.class_name(), "btn btn-primary");
}

// ============================================================================
// Decorators and delays
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_okay_decorator_replaces_spinner_then_restores() {
    let formset = RecordingFormset::new();
    let b = Arc::new(button(&formset, "spinner -> submit -> okay(1000)"));

    let runner = Arc::clone(&b);
    let handle = tokio::spawn(async move { runner.activate().await });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(b.element().has_class("dj-okay"));
    assert!(!b.element().has_class("dj-submitting"));
    assert!(b.is_running());

    let activation = handle.await.unwrap();
    assert!(activation.is_fulfilled());
    assert_eq!(b.element().class_name(), "btn btn-primary");
}

#[tokio::test(start_paused = true)]
async fn test_bummer_uses_configured_pause() {
    let formset = RecordingFormset::new().reply(Reply::status(500, serde_json::Value::Null));
    let settings = ButtonSettings {
        bummer_delay_ms: 2000,
        ..ButtonSettings::default()
    };
    let b = Arc::new(button_with(
        Arc::new(formset),
        "submit !~ bummer",
        &ActionRegistry::with_builtins(),
        settings,
    ));

    let runner = Arc::clone(&b);
    let handle = tokio::spawn(async move { runner.activate().await });

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(b.element().has_class("dj-bummer"));
    assert!(!handle.is_finished());

    assert!(matches!(handle.await.unwrap(), Activation::Recovered(_)));
    assert!(!b.element().has_class("dj-bummer"));
}

#[tokio::test(start_paused = true)]
async fn test_delay_holds_chain() {
    let trace: Trace = Arc::default();
    let registry = tracing_registry(&trace);
    let b = Arc::new(button_with(
        Arc::new(RecordingFormset::new()),
        "mark('before') -> delay(300) -> mark('after')",
        &registry,
        ButtonSettings::default(),
    ));

    let runner = Arc::clone(&b);
    let handle = tokio::spawn(async move { runner.activate().await });

    tokio::time::sleep(Duration::from_millis(299)).await;
    assert_eq!(*trace.lock().unwrap(), vec!["before"]);

    assert!(handle.await.unwrap().is_fulfilled());
    assert_eq!(*trace.lock().unwrap(), vec!["before", "after"]);
}

// ============================================================================
// Abort
// ============================================================================

#[tokio::test]
async fn test_abort_without_pending_delay_is_noop() {
    let formset = RecordingFormset::new();
    let b = button(&formset, "addClass('busy') -> submit");

    b.abort_action();
    b.abort_action();

    assert_eq!(formset.abort_count(), 2);
    assert_eq!(b.element().class_name(), "btn btn-primary");
    assert!(b.activate().await.is_fulfilled());
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_pending_delay() {
    let trace: Trace = Arc::default();
    let registry = tracing_registry(&trace);
    let b = Arc::new(button_with(
        Arc::new(RecordingFormset::new()),
        "disable -> addClass('busy') -> delay(5000) -> mark('late') !~ mark('recover')",
        &registry,
        ButtonSettings::default(),
    ));

    let runner = Arc::clone(&b);
    let handle = tokio::spawn(async move { runner.activate().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(b.element().is_disabled());
    b.abort_action();
    b.abort_action();

    assert_eq!(handle.await.unwrap(), Activation::Aborted);
    assert!(trace.lock().unwrap().is_empty());
    assert!(!b.element().is_disabled());
    assert_eq!(b.element().class_name(), "btn btn-primary");
}

#[tokio::test(start_paused = true)]
async fn test_abort_forwards_to_formset_in_flight_request() {
    let formset = RecordingFormset::new().reply(Reply::Hang);
    let b = Arc::new(button(&formset, "submit -> proceed('/ok/') !~ addClass('failed')"));

    let runner = Arc::clone(&b);
    let handle = tokio::spawn(async move { runner.activate().await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    b.abort_action();

    assert_eq!(handle.await.unwrap(), Activation::Aborted);
    assert_eq!(formset.abort_count(), 1);
    assert_eq!(b.element().location(), "/form/");
}

// ============================================================================
// Re-entrant activation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reentrant_activations_run_concurrently_by_default() {
    let formset = RecordingFormset::new()
        .reply(Reply::Slow(
            Duration::from_millis(100),
            formset_rs_actions::Response::ok(serde_json::json!({})),
        ))
        .reply(Reply::ok(serde_json::json!({})));
    let b = button(&formset, "submit");

    let (first, second) = tokio::join!(b.activate(), b.activate());

    assert!(first.is_fulfilled());
    assert!(second.is_fulfilled());
    assert_eq!(formset.submissions().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reentrant_activation_skipped_when_ignored() {
    let formset = RecordingFormset::new().reply(Reply::Slow(
        Duration::from_millis(100),
        formset_rs_actions::Response::ok(serde_json::json!({})),
    ));
    let settings = ButtonSettings {
        reentrancy: Reentrancy::Ignore,
        ..ButtonSettings::default()
    };
    let b = button_with(
        Arc::new(formset.clone()),
        "submit",
        &ActionRegistry::with_builtins(),
        settings,
    );

    let (first, second) = tokio::join!(b.activate(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        b.activate().await
    });

    assert!(first.is_fulfilled());
    assert_eq!(second, Activation::Skipped);
    assert_eq!(formset.submissions().len(), 1);

    assert!(b.activate().await.is_fulfilled());
}

// ============================================================================
// Router-backed formset
// ============================================================================

fn app() -> Router {
    Router::new().route(
        "/submit/",
        post(|Json(body): Json<serde_json::Value>| async move {
            let email = body["formset_data"]["email"].as_str().unwrap_or_default();
            if email.contains('@') {
                (
                    StatusCode::OK,
                    Json(serde_json::json!({"success_url": "/welcome/"})),
                )
            } else {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({"email": ["Enter a valid email address."]})),
                )
            }
        }),
    )
}

#[tokio::test]
async fn test_router_formset_end_to_end() {
    let formset = RouterFormset::new(app(), "/submit/")
        .with_initial(serde_json::json!({"email": "nobody"}));
    let b = button_with(
        Arc::new(formset.clone()),
        "disable -> spinner -> submit -> proceed !~ clearErrors -> emit('failed')",
        &ActionRegistry::with_builtins(),
        ButtonSettings::default(),
    );
    let log = EventLog::attach(b.element());

    assert!(matches!(b.activate().await, Activation::Recovered(Some(_))));
    assert_eq!(log.types(), vec!["failed"]);
    assert_eq!(formset.errors_cleared(), 1);

    formset.set_field("email", serde_json::json!("ada@example.com"));
    assert!(b.activate().await.is_fulfilled());
    assert_eq!(log.navigations(), vec!["/welcome/"]);
    assert!(!b.element().has_class("dj-submitting"));
}

//! Built-in actions.
//!
//! | action | arguments | effect |
//! |---|---|---|
//! | `disable` / `enable` | none | set / clear the element's disabled flag |
//! | `addClass` / `removeClass` / `toggleClass` | class name | edit the class list |
//! | `submit` | optional extra data | submit the formset; reject unless HTTP 200 |
//! | `reset` | none | restore the formset's initial values |
//! | `clearErrors` | none | remove displayed validation errors |
//! | `proceed` | optional fallback URL | navigate to the response's `success_url` |
//! | `reload` | none | navigate to the current location |
//! | `emit` | event name, optional detail | dispatch a custom event |
//! | `activate` | any | dispatch an `activate` event with the arguments |
//! | `delay` | milliseconds | pause the chain; cancelled by abort |
//! | `spinner` | none | add the spinner class |
//! | `okay` / `bummer` | optional milliseconds | show the decorator, then pause |
//! | `intercept` | none | log the value passing through |
//! | `noop` | none | nothing |
//!
//! Every action except `submit` and `proceed` hands its input on unchanged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use formset_rs_core::error::{FormsetError, FormsetResult};
use formset_rs_events::CustomEvent;

use crate::argument::BoundArgument;
use crate::button::ButtonContext;
use crate::registry::{ActionRegistry, ActionStep, Rejection, StepFailure, StepInput, StepResult};

/// Name of the event dispatched by `activate(...)`.
pub const ACTIVATE_EVENT: &str = "activate";

/// A built-in action with its validated arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinAction {
    Disable,
    Enable,
    AddClass(String),
    RemoveClass(String),
    ToggleClass(String),
    Submit(Option<BoundArgument>),
    Reset,
    ClearErrors,
    Proceed(Option<String>),
    Reload,
    Emit {
        event: String,
        detail: Option<BoundArgument>,
    },
    Activate(Vec<BoundArgument>),
    Delay(Duration),
    Spinner,
    Okay(Option<Duration>),
    Bummer(Option<Duration>),
    Intercept,
    Noop,
}

/// Names of every built-in action.
pub const BUILTIN_ACTIONS: &[&str] = &[
    "disable",
    "enable",
    "addClass",
    "removeClass",
    "toggleClass",
    "submit",
    "reset",
    "clearErrors",
    "proceed",
    "reload",
    "emit",
    "activate",
    "delay",
    "spinner",
    "okay",
    "bummer",
    "intercept",
    "noop",
];

/// Registers every built-in action in `registry`.
pub fn register_builtin_actions(registry: &mut ActionRegistry) {
    for &name in BUILTIN_ACTIONS {
        registry.register(
            name,
            Arc::new(move |args: &[BoundArgument]| {
                BuiltinAction::from_call(name, args)
                    .map(|action| Box::new(action) as Box<dyn ActionStep>)
            }),
        );
    }
}

impl BuiltinAction {
    /// Checks `args` against the signature of the built-in `name`.
    pub fn from_call(name: &str, args: &[BoundArgument]) -> FormsetResult<Self> {
        Ok(match name {
            "disable" => no_args(name, args).map(|()| Self::Disable)?,
            "enable" => no_args(name, args).map(|()| Self::Enable)?,
            "addClass" => Self::AddClass(class_arg(name, args)?),
            "removeClass" => Self::RemoveClass(class_arg(name, args)?),
            "toggleClass" => Self::ToggleClass(class_arg(name, args)?),
            "submit" => Self::Submit(optional_arg(name, args)?.cloned()),
            "reset" => no_args(name, args).map(|()| Self::Reset)?,
            "clearErrors" => no_args(name, args).map(|()| Self::ClearErrors)?,
            "proceed" => proceed(args)?,
            "reload" => no_args(name, args).map(|()| Self::Reload)?,
            "emit" => emit(args)?,
            "activate" => Self::Activate(args.to_vec()),
            "delay" => match args {
                [ms] => Self::Delay(millis(name, ms)?),
                _ => return Err(invalid(name, format!("expected 1 argument, got {}", args.len()))),
            },
            "spinner" => no_args(name, args).map(|()| Self::Spinner)?,
            "okay" => Self::Okay(optional_millis(name, args)?),
            "bummer" => Self::Bummer(optional_millis(name, args)?),
            "intercept" => no_args(name, args).map(|()| Self::Intercept)?,
            "noop" => no_args(name, args).map(|()| Self::Noop)?,
            other => {
                return Err(FormsetError::NameResolution {
                    name: other.to_string(),
                })
            }
        })
    }
}

fn invalid(action: &str, reason: impl Into<String>) -> FormsetError {
    FormsetError::InvalidArguments {
        action: action.to_string(),
        reason: reason.into(),
    }
}

fn no_args(action: &str, args: &[BoundArgument]) -> FormsetResult<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(invalid(action, format!("expected no arguments, got {}", args.len())))
    }
}

fn optional_arg<'a>(
    action: &str,
    args: &'a [BoundArgument],
) -> FormsetResult<Option<&'a BoundArgument>> {
    match args {
        [] => Ok(None),
        [arg] => Ok(Some(arg)),
        _ => Err(invalid(
            action,
            format!("expected at most 1 argument, got {}", args.len()),
        )),
    }
}

fn class_arg(action: &str, args: &[BoundArgument]) -> FormsetResult<String> {
    let [arg] = args else {
        return Err(invalid(action, format!("expected 1 argument, got {}", args.len())));
    };
    match arg.as_str() {
        Some(class) if !class.is_empty() && !class.contains(char::is_whitespace) => {
            Ok(class.to_string())
        }
        _ => Err(invalid(action, "expected a single class name")),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn millis(action: &str, arg: &BoundArgument) -> FormsetResult<Duration> {
    match arg.as_f64() {
        Some(ms) if ms.is_finite() && ms >= 0.0 => {
            Ok(Duration::from_micros((ms * 1000.0).round() as u64))
        }
        _ => Err(invalid(action, "expected a non-negative number of milliseconds")),
    }
}

fn optional_millis(action: &str, args: &[BoundArgument]) -> FormsetResult<Option<Duration>> {
    optional_arg(action, args)?
        .map(|arg| millis(action, arg))
        .transpose()
}

fn proceed(args: &[BoundArgument]) -> FormsetResult<BuiltinAction> {
    let fallback = match optional_arg("proceed", args)? {
        None => None,
        Some(arg) => Some(
            arg.as_str()
                .ok_or_else(|| invalid("proceed", "expected a URL string"))?
                .to_string(),
        ),
    };
    Ok(BuiltinAction::Proceed(fallback))
}

fn emit(args: &[BoundArgument]) -> FormsetResult<BuiltinAction> {
    let (name, detail) = match args {
        [name] => (name, None),
        [name, detail] => (name, Some(detail.clone())),
        _ => {
            return Err(invalid(
                "emit",
                format!("expected 1 or 2 arguments, got {}", args.len()),
            ))
        }
    };
    match name.as_str() {
        Some(event) if !event.is_empty() => Ok(BuiltinAction::Emit {
            event: event.to_string(),
            detail,
        }),
        _ => Err(invalid("emit", "expected an event name")),
    }
}

impl BuiltinAction {
    /// Replaces any decorator class with `class`, then pauses for `pause`.
    async fn decorate(
        ctx: &ButtonContext,
        class: &str,
        pause: Duration,
    ) -> Result<(), StepFailure> {
        let element = ctx.element();
        for decorator in ctx.settings().decorator_classes() {
            element.remove_class(decorator);
        }
        element.add_class(class);
        if pause.is_zero() {
            Ok(())
        } else {
            ctx.sleep(pause).await
        }
    }
}

#[async_trait]
impl ActionStep for BuiltinAction {
    async fn run(&self, ctx: &ButtonContext, input: StepInput) -> StepResult {
        let element = ctx.element();
        match self {
            Self::Disable => element.set_disabled(true),
            Self::Enable => element.set_disabled(false),
            Self::AddClass(class) => element.add_class(class),
            Self::RemoveClass(class) => element.remove_class(class),
            Self::ToggleClass(class) => {
                element.toggle_class(class);
            }
            Self::Submit(data) => {
                let extra = data.as_ref().map(|d| d.evaluate(ctx.formset()));
                return match ctx.formset().submit(extra).await? {
                    Some(response) if response.is_ok() => Ok(Some(response)),
                    Some(response) => {
                        tracing::debug!(status = %response.status, "submission rejected");
                        Err(StepFailure::Rejected(Rejection::Response(response)))
                    }
                    None => Err(StepFailure::Rejected(Rejection::NoResponse)),
                };
            }
            Self::Reset => ctx.formset().reset_to_initial(),
            Self::ClearErrors => ctx.formset().clear_errors(),
            Self::Proceed(fallback) => {
                let url = input
                    .as_ref()
                    .filter(|response| response.is_ok())
                    .and_then(|response| response.success_url())
                    .or(fallback.as_deref());
                match url {
                    Some(url) => element.navigate(url),
                    None => return Err(StepFailure::error("Unable to proceed to next page")),
                }
            }
            Self::Reload => element.navigate(&element.location()),
            Self::Emit { event, detail } => {
                let detail = detail
                    .as_ref()
                    .map_or(serde_json::Value::Null, |d| d.evaluate(ctx.formset()));
                element.dispatch_event(&CustomEvent::with_detail(event.as_str(), detail));
            }
            Self::Activate(args) => {
                let detail = args.iter().map(|a| a.evaluate(ctx.formset())).collect();
                element.dispatch_event(&CustomEvent::with_detail(
                    ACTIVATE_EVENT,
                    serde_json::Value::Array(detail),
                ));
            }
            Self::Delay(duration) => ctx.sleep(*duration).await?,
            Self::Spinner => element.add_class(&ctx.settings().spinner_class),
            Self::Okay(pause) => {
                let pause =
                    pause.unwrap_or_else(|| Duration::from_millis(ctx.settings().okay_delay_ms));
                Self::decorate(ctx, &ctx.settings().okay_class, pause).await?;
            }
            Self::Bummer(pause) => {
                let pause =
                    pause.unwrap_or_else(|| Duration::from_millis(ctx.settings().bummer_delay_ms));
                Self::decorate(ctx, &ctx.settings().bummer_class, pause).await?;
            }
            Self::Intercept => {
                tracing::info!(element = %element.id(), value = ?input, "intercepted");
            }
            Self::Noop => {}
        }
        Ok(input)
    }
}

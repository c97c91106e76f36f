//! Action registry and the step contract.
//!
//! Every name usable at the top level of a chain maps to an
//! [`ActionFactory`] in an [`ActionRegistry`]. Building a chain calls the
//! factory with the call's bound arguments, which validates them and yields
//! an [`ActionStep`]. Steps are then invoked in order with the previous
//! step's output.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use formset_rs_core::error::{FormsetError, FormsetResult};

use crate::argument::BoundArgument;
use crate::button::ButtonContext;
use crate::formset::Response;

/// The value passed from one step to the next. The first step of the
/// success chain receives `None`.
pub type StepInput = Option<Response>;

/// The outcome of a single step or of a whole chain.
pub type StepResult = Result<StepInput, StepFailure>;

/// Why a chain stopped before its end.
#[derive(Debug, Clone, PartialEq)]
pub enum StepFailure {
    /// A step rejected; the reject chain may recover.
    Rejected(Rejection),
    /// The running action was aborted; no recovery is attempted.
    Aborted,
}

impl StepFailure {
    /// Shorthand for a rejection carrying a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Rejected(Rejection::Error(message.into()))
    }
}

impl From<FormsetError> for StepFailure {
    fn from(error: FormsetError) -> Self {
        match error {
            FormsetError::Aborted => Self::Aborted,
            other => Self::error(other.to_string()),
        }
    }
}

/// The reason a step rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The endpoint answered with something other than HTTP 200.
    Response(Response),
    /// The formset sent nothing, e.g. because a form did not validate.
    NoResponse,
    /// A step failed with an error.
    Error(String),
}

impl Rejection {
    /// The value handed to the first step of the reject chain.
    pub fn into_input(self) -> StepInput {
        match self {
            Self::Response(response) => Some(response),
            Self::NoResponse | Self::Error(_) => None,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(response) => write!(f, "response with status {}", response.status),
            Self::NoResponse => write!(f, "no response"),
            Self::Error(message) => write!(f, "{message}"),
        }
    }
}

/// One executable step of a chain.
#[async_trait]
pub trait ActionStep: Send + Sync + fmt::Debug {
    /// Runs the step against the button's context with the previous output.
    async fn run(&self, ctx: &ButtonContext, input: StepInput) -> StepResult;
}

/// Validates bound arguments and produces a step.
pub type ActionFactory =
    Arc<dyn Fn(&[BoundArgument]) -> FormsetResult<Box<dyn ActionStep>> + Send + Sync>;

/// Maps action names to factories.
///
/// # Examples
///
/// ```
/// use formset_rs_actions::registry::ActionRegistry;
///
/// let registry = ActionRegistry::with_builtins();
/// assert!(registry.contains("submit"));
/// assert!(!registry.contains("explode"));
/// ```
#[derive(Clone, Default)]
pub struct ActionRegistry {
    factories: HashMap<String, ActionFactory>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in action.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtin::register_builtin_actions(&mut registry);
        registry
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, factory: ActionFactory) {
        let name = name.into();
        tracing::trace!(action = %name, "registering action");
        self.factories.insert(name, factory);
    }

    /// Registers a step that takes no arguments.
    pub fn register_step<S>(&mut self, name: impl Into<String>, step: S)
    where
        S: ActionStep + Clone + 'static,
    {
        let name = name.into();
        let action = name.clone();
        self.register(
            name,
            Arc::new(move |args: &[BoundArgument]| {
                if !args.is_empty() {
                    return Err(FormsetError::InvalidArguments {
                        action: action.clone(),
                        reason: format!("expected no arguments, got {}", args.len()),
                    });
                }
                Ok(Box::new(step.clone()) as Box<dyn ActionStep>)
            }),
        );
    }

    /// Looks up the factory for `name`.
    pub fn get(&self, name: &str) -> Option<&ActionFactory> {
        self.factories.get(name)
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Builds a step for `name` from `args`.
    ///
    /// # Errors
    ///
    /// [`FormsetError::NameResolution`] for an unregistered name, or whatever
    /// the factory reports for unacceptable arguments.
    pub fn create(&self, name: &str, args: &[BoundArgument]) -> FormsetResult<Box<dyn ActionStep>> {
        let factory = self.get(name).ok_or_else(|| FormsetError::NameResolution {
            name: name.to_string(),
        })?;
        factory(args)
    }

    /// All registered names, sorted.
    pub fn list_actions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.list_actions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[derive(Debug, Clone)]
    struct Hello;

    #[async_trait]
    impl ActionStep for Hello {
        async fn run(&self, _ctx: &ButtonContext, input: StepInput) -> StepResult {
            Ok(input)
        }
    }

    #[test]
    fn test_register_and_list() {
        let mut registry = ActionRegistry::new();
        assert!(registry.is_empty());
        registry.register_step("zeta", Hello);
        registry.register_step("alpha", Hello);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list_actions(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_create_unknown_name() {
        let registry = ActionRegistry::new();
        match registry.create("explode", &[]) {
            Err(FormsetError::NameResolution { name }) => assert_eq!(name, "explode"),
            other => panic!("expected name resolution error, got {other:?}"),
        }
    }

    #[test]
    fn test_register_step_rejects_arguments() {
        let mut registry = ActionRegistry::new();
        registry.register_step("hello", Hello);
        assert!(registry.create("hello", &[]).is_ok());
        let err = registry
            .create("hello", &[BoundArgument::Literal(serde_json::json!(1))])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments for hello(): expected no arguments, got 1"
        );
    }

    #[test]
    fn test_builtins_present() {
        let registry = ActionRegistry::with_builtins();
        for name in ["disable", "enable", "submit", "reset", "proceed", "delay", "intercept"] {
            assert!(registry.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_rejection_into_input() {
        let response = Response::new(StatusCode::BAD_REQUEST, serde_json::Value::Null);
        assert_eq!(
            Rejection::Response(response.clone()).into_input(),
            Some(response)
        );
        assert_eq!(Rejection::NoResponse.into_input(), None);
        assert_eq!(Rejection::Error("x".into()).into_input(), None);
    }

    #[test]
    fn test_aborted_error_maps_to_abort() {
        assert_eq!(StepFailure::from(FormsetError::Aborted), StepFailure::Aborted);
        assert!(matches!(
            StepFailure::from(FormsetError::Submission("down".into())),
            StepFailure::Rejected(Rejection::Error(_))
        ));
    }
}

//! Arguments bound to an action at build time.
//!
//! Literal arguments are converted to JSON once, when the chain is built.
//! Nested value functions are resolved by name at build time too, but the
//! data they read is looked up when the step runs, so `getDataValue` sees the
//! form as it is at activation.
//!
//! | value function | result |
//! |---|---|
//! | `getDataValue('a.b')`, `getDataValue(['a', 'b'])` | the formset's current value at `a.b`, or `null` |
//! | `prefill(value)` | `{"prefill": value}` |

use std::collections::BTreeMap;

use formset_rs_core::error::{FormsetError, FormsetResult};

use crate::ast::{ArgumentValue, GET_DATA_VALUE};
use crate::formset::Formset;

/// Name of the value function wrapping data to prefill a dialog with.
pub const PREFILL: &str = "prefill";

/// An argument after name resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundArgument {
    /// A fully known value.
    Literal(serde_json::Value),
    /// The formset's value at a dotted path, read at step invocation.
    DataValue(String),
    /// `{"prefill": inner}`.
    Prefill(Box<BoundArgument>),
    /// An array with at least one deferred element.
    Array(Vec<BoundArgument>),
    /// An object with at least one deferred member.
    Object(BTreeMap<String, BoundArgument>),
}

impl BoundArgument {
    /// Resolves value-function names in `arg`, an argument of `action`, and
    /// converts literals to JSON.
    pub fn bind(action: &str, arg: &ArgumentValue) -> FormsetResult<Self> {
        if !arg.contains_call() {
            return arg.to_json().map(Self::Literal).ok_or_else(|| {
                FormsetError::InvalidArguments {
                    action: action.to_string(),
                    reason: format!("{arg} is not representable as JSON"),
                }
            });
        }

        match arg {
            ArgumentValue::Array(items) => Ok(Self::Array(
                items.iter().map(|item| Self::bind(action, item)).collect::<FormsetResult<_>>()?,
            )),
            ArgumentValue::Object(map) => Ok(Self::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Self::bind(action, v)?)))
                    .collect::<FormsetResult<_>>()?,
            )),
            ArgumentValue::Call(call) => match call.name.as_str() {
                GET_DATA_VALUE => match call.args.as_slice() {
                    [path] => data_path(path).map(Self::DataValue),
                    _ => Err(arity_error(GET_DATA_VALUE, call.args.len())),
                },
                PREFILL => match call.args.as_slice() {
                    [inner] => Ok(Self::Prefill(Box::new(Self::bind(action, inner)?))),
                    _ => Err(arity_error(PREFILL, call.args.len())),
                },
                other => Err(FormsetError::NameResolution {
                    name: other.to_string(),
                }),
            },
            _ => unreachable!("scalars never contain calls"),
        }
    }

    /// Produces the argument's value, reading deferred data from `formset`.
    pub fn evaluate(&self, formset: &dyn Formset) -> serde_json::Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::DataValue(path) => formset
                .get_data_value(path)
                .unwrap_or(serde_json::Value::Null),
            Self::Prefill(inner) => serde_json::json!({ "prefill": inner.evaluate(formset) }),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(|i| i.evaluate(formset)).collect())
            }
            Self::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.evaluate(formset)))
                    .collect(),
            ),
        }
    }

    /// The value if it is known at build time.
    pub const fn as_literal(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// The string if this is a literal string.
    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(serde_json::Value::as_str)
    }

    /// The number if this is a literal number.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_literal().and_then(serde_json::Value::as_f64)
    }
}

fn data_path(arg: &ArgumentValue) -> FormsetResult<String> {
    let invalid = || FormsetError::InvalidArguments {
        action: GET_DATA_VALUE.to_string(),
        reason: format!("expected a path string or an array of strings, got {arg}"),
    };

    let segments: Vec<&str> = match arg {
        ArgumentValue::String(path) => path.split('.').collect(),
        ArgumentValue::Array(items) => items
            .iter()
            .map(ArgumentValue::as_str)
            .collect::<Option<_>>()
            .ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };

    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(invalid());
    }
    Ok(segments.join("."))
}

fn arity_error(name: &str, given: usize) -> FormsetError {
    FormsetError::InvalidArguments {
        action: name.to_string(),
        reason: format!("expected exactly 1 argument, got {given}"),
    }
}

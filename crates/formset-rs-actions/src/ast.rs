//! Syntax tree of a button action expression.
//!
//! An expression such as `addClass('busy') -> submit() !~ removeClass('busy')`
//! parses into a [`ParseResult`] holding two ordered chains of [`ActionCall`]s.
//! Arguments are [`ArgumentValue`]s: JSON-like literals, plus nested calls for
//! the value functions (`getDataValue`, `prefill`) usable inside argument
//! lists.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Name of the value function a bare data path is rewritten to.
pub const GET_DATA_VALUE: &str = "getDataValue";

/// A positional argument of an [`ActionCall`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    /// `null`
    Null,
    /// `true` or `false`
    Boolean(bool),
    /// A JSON number, always held as a 64-bit float.
    Number(f64),
    /// A single- or double-quoted string with escapes resolved.
    String(String),
    /// `[ ... ]`
    Array(Vec<ArgumentValue>),
    /// `{ key: value, ... }`; key order carries no meaning.
    Object(BTreeMap<String, ArgumentValue>),
    /// A nested call inside an argument list, e.g. `prefill(...)` or the
    /// `getDataValue([...])` produced from a dotted path.
    Call(ActionCall),
}

impl ArgumentValue {
    /// Builds the `getDataValue([...])` call a dotted data path stands for.
    pub fn data_path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Call(ActionCall::new(
            GET_DATA_VALUE,
            vec![Self::Array(
                segments.into_iter().map(|s| Self::String(s.into())).collect(),
            )],
        ))
    }

    /// A short name of the value's kind, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Call(_) => "function call",
        }
    }

    /// Returns the string content if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this is a number.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns `true` if this value or anything nested in it is a call.
    pub fn contains_call(&self) -> bool {
        match self {
            Self::Call(_) => true,
            Self::Array(items) => items.iter().any(Self::contains_call),
            Self::Object(map) => map.values().any(Self::contains_call),
            _ => false,
        }
    }

    /// Converts a call-free value into JSON. Returns `None` if a nested call
    /// is present or a number is not finite.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Self::Null => serde_json::Value::Null,
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number)?,
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => serde_json::Value::Array(
                items.iter().map(Self::to_json).collect::<Option<Vec<_>>>()?,
            ),
            Self::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Option<serde_json::Map<_, _>>>()?,
            ),
            Self::Call(_) => return None,
        })
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            #[allow(clippy::cast_possible_truncation)]
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write_quoted(f, s),
            Self::Array(items) => {
                write!(f, "[")?;
                write_separated(f, items)?;
                write!(f, "]")
            }
            Self::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ": {value}")?;
                }
                write!(f, "}}")
            }
            Self::Call(call) => write!(f, "{call}"),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'")?;
    for ch in s.chars() {
        match ch {
            '\\' => write!(f, "\\\\")?,
            '\'' => write!(f, "\\'")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            '\u{8}' => write!(f, "\\b")?,
            '\u{c}' => write!(f, "\\f")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "'")
}

fn write_separated(f: &mut fmt::Formatter<'_>, items: &[ArgumentValue]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// One call in a chain: a function name and its positional arguments.
///
/// A bare name (`submit`) and an empty call (`submit()`) both produce an
/// `ActionCall` with no arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionCall {
    /// The function name, an identifier.
    pub name: String,
    /// Positional arguments in source order.
    pub args: Vec<ArgumentValue>,
}

impl ActionCall {
    /// Creates a call with the given arguments.
    pub fn new(name: impl Into<String>, args: Vec<ArgumentValue>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Creates a call without arguments.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

impl fmt::Display for ActionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_separated(f, &self.args)?;
        write!(f, ")")
    }
}

/// An ordered sequence of calls; textual order is execution order.
pub type ActionChain = Vec<ActionCall>;

/// The two chains of a parsed expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    /// Calls left of `!~`, run on activation.
    pub success_chain: ActionChain,
    /// Calls right of `!~`, run when the success chain rejects. Empty when the
    /// expression has no `!~`.
    pub reject_chain: ActionChain,
}

impl ParseResult {
    /// Iterates over the names of all top-level calls in both chains.
    pub fn call_names(&self) -> impl Iterator<Item = &str> {
        self.success_chain
            .iter()
            .chain(&self.reject_chain)
            .map(|call| call.name.as_str())
    }
}

impl fmt::Display for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_chain(f, &self.success_chain)?;
        if !self.reject_chain.is_empty() {
            write!(f, " !~ ")?;
            write_chain(f, &self.reject_chain)?;
        }
        Ok(())
    }
}

fn write_chain(f: &mut fmt::Formatter<'_>, chain: &[ActionCall]) -> fmt::Result {
    for (i, call) in chain.iter().enumerate() {
        if i > 0 {
            write!(f, " -> ")?;
        }
        write!(f, "{call}")?;
    }
    Ok(())
}

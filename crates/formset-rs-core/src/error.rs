//! Core error types for the formset-rs framework.
//!
//! This module provides [`FormsetError`], the error raised while setting up a
//! button (parsing its action attribute, resolving names, checking arguments),
//! while loading configuration, and by formset collaborators. Failures of a
//! running action chain are not errors of this kind: they travel inside the
//! engine as step rejections.

use std::fmt;

use thiserror::Error;

/// A syntax error found while parsing an action expression.
///
/// Carries the position of the rightmost failure, the set of tokens that
/// would have been accepted there, and the token actually found.
///
/// # Examples
///
/// ```
/// use formset_rs_core::error::ParseError;
///
/// let err = ParseError::new(
///     "submit -> ",
///     10,
///     vec!["identifier".to_string()],
///     None,
/// );
/// assert_eq!(err.column, 11);
/// assert_eq!(err.to_string(), "Expected identifier but end of input found.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset into the source where parsing failed.
    pub offset: usize,
    /// 1-based line of the failure.
    pub line: usize,
    /// 1-based column (in characters) of the failure.
    pub column: usize,
    /// Descriptions of the tokens that were expected, sorted and deduplicated.
    pub expected: Vec<String>,
    /// The character found at the failure position, `None` at end of input.
    pub found: Option<char>,
}

impl ParseError {
    /// Creates a parse error, computing line and column from `source`.
    pub fn new(source: &str, offset: usize, mut expected: Vec<String>, found: Option<char>) -> Self {
        expected.sort();
        expected.dedup();

        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = source[line_start..offset].chars().count() + 1;

        Self {
            offset,
            line,
            column,
            expected,
            found,
        }
    }

    fn describe_expected(&self) -> String {
        match self.expected.as_slice() {
            [] => "end of input".to_string(),
            [only] => only.clone(),
            [first, second] => format!("{first} or {second}"),
            [init @ .., last] => format!("{}, or {last}", init.join(", ")),
        }
    }

    fn describe_found(&self) -> String {
        self.found.map_or_else(
            || "end of input".to_string(),
            |ch| format!("\"{}\"", ch.escape_default()),
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} but {} found.",
            self.describe_expected(),
            self.describe_found()
        )
    }
}

impl std::error::Error for ParseError {}

/// The primary error type for the formset-rs framework.
#[derive(Error, Debug)]
pub enum FormsetError {
    // ── Setup errors ─────────────────────────────────────────────────

    /// An action expression is not well formed.
    #[error("Syntax error at line {line}, column {column}: {0}", line = .0.line, column = .0.column)]
    Syntax(ParseError),

    /// A parsed call names an operation that is not registered.
    #[error("Unknown action: {name}")]
    NameResolution {
        /// The unresolved function name.
        name: String,
    },

    /// An operation was given arguments it cannot accept.
    #[error("Invalid arguments for {action}(): {reason}")]
    InvalidArguments {
        /// The operation name.
        action: String,
        /// What is wrong with the arguments.
        reason: String,
    },

    /// Setting up a single button failed; wraps the underlying cause.
    #[error("Error in attribute 'click' of button '{element}': {source}")]
    Construction {
        /// Identifies the button element whose setup failed.
        element: String,
        /// The parse or resolution error.
        #[source]
        source: Box<FormsetError>,
    },

    // ── Collaborator errors ──────────────────────────────────────────

    /// The formset could not submit its data.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// An in-flight operation was aborted.
    #[error("Operation aborted")]
    Aborted,

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormsetError {
    /// Wraps this error with the identity of the button being constructed.
    #[must_use]
    pub fn in_element(self, element: impl Into<String>) -> Self {
        Self::Construction {
            element: element.into(),
            source: Box::new(self),
        }
    }

    /// Returns `true` for errors raised while setting up a button
    /// (parse, resolution, argument and construction errors).
    pub const fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::Syntax(_)
                | Self::NameResolution { .. }
                | Self::InvalidArguments { .. }
                | Self::Construction { .. }
        )
    }
}

impl From<ParseError> for FormsetError {
    fn from(err: ParseError) -> Self {
        Self::Syntax(err)
    }
}

/// A convenience type alias for `Result<T, FormsetError>`.
pub type FormsetResult<T> = Result<T, FormsetError>;

//! The `check` management command.
//!
//! Parses an action expression, builds it against the built-in actions and
//! reports what would go wrong when a button carrying it is set up or
//! activated.

use std::io::Write;

use async_trait::async_trait;
use formset_rs_actions::ast::ParseResult;
use formset_rs_actions::builder::build;
use formset_rs_actions::parser::parse;
use formset_rs_actions::registry::ActionRegistry;
use formset_rs_core::{FormsetError, FormsetSettings};

use crate::command::{ManagementCommand, Output};

/// Checks an expression for errors and likely mistakes.
pub struct CheckCommand;

/// The result of a single check.
#[derive(Debug, Clone)]
pub struct CheckMessage {
    /// The severity level of this check result.
    pub level: CheckLevel,
    /// A human-readable description of the issue.
    pub msg: String,
    /// An optional hint for how to resolve the issue.
    pub hint: Option<String>,
    /// A unique identifier for this check (e.g. "chain.W001").
    pub id: &'static str,
}

/// Severity levels for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    /// The expression works but is likely not what was meant.
    Warning,
    /// A button with this expression cannot be set up.
    Error,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Points at column `column` (1-based) below `expression`.
fn caret(expression: &str, column: usize) -> String {
    let line = expression.lines().next().unwrap_or_default();
    format!("{line}\n{}^", " ".repeat(column.saturating_sub(1)))
}

fn error_message(expression: &str, error: &FormsetError) -> CheckMessage {
    let (id, hint) = match error {
        FormsetError::Syntax(parse) if parse.line == 1 => {
            ("syntax.E001", Some(caret(expression, parse.column)))
        }
        FormsetError::Syntax(_) => ("syntax.E001", None),
        FormsetError::NameResolution { .. } => (
            "names.E001",
            Some("Run `formset actions` for the available names".to_string()),
        ),
        FormsetError::InvalidArguments { .. } => ("arguments.E001", None),
        _ => ("check.E001", None),
    };
    CheckMessage {
        level: CheckLevel::Error,
        msg: error.to_string(),
        hint,
        id,
    }
}

fn lint(parsed: &ParseResult) -> Vec<CheckMessage> {
    let mut messages = Vec::new();
    let success: Vec<&str> = parsed.success_chain.iter().map(|c| c.name.as_str()).collect();

    if success.contains(&"submit") && parsed.reject_chain.is_empty() {
        messages.push(CheckMessage {
            level: CheckLevel::Warning,
            msg: "submit() without a reject chain".to_string(),
            hint: Some("Append `!~ ...` to handle a failed submission".to_string()),
            id: "chain.W001",
        });
    }

    for (index, call) in parsed.success_chain.iter().enumerate() {
        if call.name == "proceed" && call.args.is_empty() && !success[..index].contains(&"submit") {
            messages.push(CheckMessage {
                level: CheckLevel::Warning,
                msg: "proceed() has neither a response to follow nor a fallback URL".to_string(),
                hint: Some("Call submit() earlier or pass a URL to proceed()".to_string()),
                id: "chain.W002",
            });
        }
    }

    if parsed
        .success_chain
        .first()
        .is_some_and(|first| first.name != "disable")
        && success.contains(&"submit")
    {
        messages.push(CheckMessage {
            level: CheckLevel::Warning,
            msg: "the button stays enabled while submitting".to_string(),
            hint: Some("Start the chain with disable() to prevent double submission".to_string()),
            id: "chain.W003",
        });
    }

    messages
}

/// Runs all checks on `expression` against `registry`.
pub fn run_checks(expression: &str, registry: &ActionRegistry) -> Vec<CheckMessage> {
    let parsed = match parse(expression) {
        Ok(parsed) => parsed,
        Err(error) => return vec![error_message(expression, &FormsetError::from(error))],
    };
    match build(&parsed, registry) {
        Ok(_) => lint(&parsed),
        Err(error) => vec![error_message(expression, &error)],
    }
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Check an action expression for errors"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(super::expression_arg()).arg(
            clap::Arg::new("deny-warnings")
                .long("deny-warnings")
                .action(clap::ArgAction::SetTrue)
                .help("Fail on warnings too"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        _settings: &FormsetSettings,
        out: &mut Output,
    ) -> Result<(), FormsetError> {
        let expression = matches
            .get_one::<String>("expression")
            .map_or("", String::as_str);
        let messages = run_checks(expression, &ActionRegistry::with_builtins());

        if messages.is_empty() {
            writeln!(out, "Check identified no issues.")?;
            return Ok(());
        }

        let errors = messages.iter().filter(|m| m.level == CheckLevel::Error).count();
        let warnings = messages.len() - errors;

        for msg in &messages {
            let hint_text = msg
                .hint
                .as_ref()
                .map_or(String::new(), |h| format!("\n\tHINT: {}", h.replace('\n', "\n\t      ")));
            writeln!(out, "{} ({}): {}{}", msg.level, msg.id, msg.msg, hint_text)?;
        }
        writeln!(
            out,
            "Check identified {} issue(s) ({errors} error(s), {warnings} warning(s)).",
            messages.len()
        )?;

        if errors > 0 || (warnings > 0 && matches.get_flag("deny-warnings")) {
            tracing::warn!(errors, warnings, "expression check failed");
            return Err(FormsetError::ConfigurationError(format!(
                "Check found {errors} error(s) and {warnings} warning(s)"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::tests::run;

    fn ids(expression: &str) -> Vec<&'static str> {
        run_checks(expression, &ActionRegistry::with_builtins())
            .iter()
            .map(|m| m.id)
            .collect()
    }

    #[test]
    fn test_clean_expression() {
        assert!(ids("disable -> submit -> proceed !~ enable").is_empty());
    }

    #[test]
    fn test_syntax_error_with_caret() {
        let messages = run_checks("submit -> ", &ActionRegistry::with_builtins());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "syntax.E001");
        assert_eq!(messages[0].level, CheckLevel::Error);
        assert_eq!(messages[0].hint.as_deref(), Some("submit -> \n          ^"));
    }

    #[test]
    fn test_unknown_name() {
        let messages = run_checks("disable -> explode", &ActionRegistry::with_builtins());
        assert_eq!(messages[0].id, "names.E001");
        assert_eq!(messages[0].msg, "Unknown action: explode");
    }

    #[test]
    fn test_invalid_arguments() {
        assert_eq!(ids("delay(-5)"), vec!["arguments.E001"]);
    }

    #[test]
    fn test_warnings() {
        assert_eq!(ids("disable -> submit"), vec!["chain.W001"]);
        assert_eq!(ids("proceed !~ noop"), vec!["chain.W002"]);
        assert_eq!(ids("spinner -> submit !~ noop"), vec!["chain.W003"]);
    }

    #[tokio::test]
    async fn test_handle_reports_and_fails_on_error() {
        let (result, out) = run(&["check", "submit(1, 2)"]).await;
        assert!(result.is_err());
        assert!(out.starts_with("ERROR (arguments.E001): Invalid arguments for submit()"));
        assert!(out.ends_with("Check identified 1 issue(s) (1 error(s), 0 warning(s)).\n"));
    }

    #[tokio::test]
    async fn test_handle_warnings_pass_unless_denied() {
        let (result, _) = run(&["check", "disable -> submit"]).await;
        assert!(result.is_ok());
        let (result, _) = run(&["check", "--deny-warnings", "disable -> submit"]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_handle_clean() {
        let (result, out) = run(&["check", "reset"]).await;
        result.unwrap();
        assert_eq!(out, "Check identified no issues.\n");
    }
}

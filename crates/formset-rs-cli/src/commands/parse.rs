//! The `parse` management command.
//!
//! Prints the success and reject chains of an action expression, as text or
//! as JSON.

use std::io::Write;

use async_trait::async_trait;
use formset_rs_actions::parser::parse;
use formset_rs_core::{FormsetError, FormsetSettings};

use crate::command::{ManagementCommand, Output};

/// Parses an expression and prints its chains.
pub struct ParseCommand;

/// Renders the chains of `expression`.
pub fn render(expression: &str, json: bool) -> Result<String, FormsetError> {
    let parsed = parse(expression)?;
    if json {
        return serde_json::to_string_pretty(&parsed)
            .map_err(|e| FormsetError::SerializationError(e.to_string()));
    }

    let chain = |calls: &[formset_rs_actions::ActionCall]| {
        if calls.is_empty() {
            "(none)".to_string()
        } else {
            calls
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ")
        }
    };
    Ok(format!(
        "success: {}\nreject:  {}",
        chain(&parsed.success_chain),
        chain(&parsed.reject_chain)
    ))
}

#[async_trait]
impl ManagementCommand for ParseCommand {
    fn name(&self) -> &'static str {
        "parse"
    }

    fn help(&self) -> &'static str {
        "Print the chains of an action expression"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(super::expression_arg()).arg(
            clap::Arg::new("json")
                .long("json")
                .action(clap::ArgAction::SetTrue)
                .help("Print the syntax tree as JSON"),
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
        let rendered = render(expression, matches.get_flag("json"))?;
        writeln!(out, "{rendered}")?;
        Ok(())
    }
}

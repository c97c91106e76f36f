//! The `actions` management command.

use std::io::Write;

use async_trait::async_trait;
use formset_rs_actions::argument::PREFILL;
use formset_rs_actions::ast::GET_DATA_VALUE;
use formset_rs_actions::registry::ActionRegistry;
use formset_rs_core::{FormsetError, FormsetSettings};

use crate::command::{ManagementCommand, Output};

/// Lists the names an action expression may call.
pub struct ActionsCommand;

/// Names usable inside arguments rather than as chain steps.
pub const VALUE_FUNCTIONS: &[&str] = &[GET_DATA_VALUE, PREFILL];

#[async_trait]
impl ManagementCommand for ActionsCommand {
    fn name(&self) -> &'static str {
        "actions"
    }

    fn help(&self) -> &'static str {
        "List the available actions and value functions"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("json")
                .long("json")
                .action(clap::ArgAction::SetTrue)
                .help("Print the names as a JSON object"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        _settings: &FormsetSettings,
        out: &mut Output,
    ) -> Result<(), FormsetError> {
        let registry = ActionRegistry::with_builtins();
        let actions = registry.list_actions();

        if matches.get_flag("json") {
            let value = serde_json::json!({
                "actions": actions,
                "values": VALUE_FUNCTIONS,
            });
            let text = serde_json::to_string_pretty(&value)
                .map_err(|e| FormsetError::SerializationError(e.to_string()))?;
            writeln!(out, "{text}")?;
            return Ok(());
        }

        writeln!(out, "[actions]")?;
        for name in &actions {
            writeln!(out, "    {name}")?;
        }
        writeln!(out, "[values]")?;
        for name in VALUE_FUNCTIONS {
            writeln!(out, "    {name}")?;
        }
        Ok(())
    }
}

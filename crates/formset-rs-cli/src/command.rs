//! Management command framework for the `formset` utility.
//!
//! A [`ManagementCommand`] declares its clap arguments and an async handler
//! that writes its report to the given output. [`CommandRegistry`] collects
//! commands, builds the clap CLI from them and dispatches to the one named
//! on the command line.
//!
//! ## Defining a Custom Command
//!
//! ```rust,no_run
//! use std::io::Write;
//! use async_trait::async_trait;
//! use formset_rs_cli::command::{ManagementCommand, Output};
//! use formset_rs_core::{FormsetError, FormsetSettings};
//!
//! struct GreetCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for GreetCommand {
//!     fn name(&self) -> &str { "greet" }
//!     fn help(&self) -> &str { "Say hello" }
//!
//!     async fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         _settings: &FormsetSettings,
//!         out: &mut Output,
//!     ) -> Result<(), FormsetError> {
//!         writeln!(out, "Hello from formset-rs!")?;
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Write;

use async_trait::async_trait;
use formset_rs_core::{FormsetError, FormsetSettings};

/// Where a command writes its report.
pub type Output = dyn Write + Send;

/// A command invocable as `formset <name>`.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &str;

    /// One-line help text.
    fn help(&self) -> &str;

    /// Adds the command's arguments. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command, writing its report to `out`.
    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &FormsetSettings,
        out: &mut Output,
    ) -> Result<(), FormsetError>;
}

/// Commands by name, kept sorted.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn ManagementCommand>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the `parse`, `check` and `actions` commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::commands::register_builtin_commands(&mut registry);
        registry
    }

    /// Registers `command`, replacing one with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Looks up a command by name.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Registered names in sorted order.
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level `formset` command with one subcommand per
    /// registered command and a global `--settings FILE` option.
    pub fn build_cli(&self) -> clap::Command {
        let app = clap::Command::new("formset")
            .about("Inspect and check button action expressions")
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                clap::Arg::new("settings")
                    .long("settings")
                    .global(true)
                    .value_name("FILE")
                    .help("Settings file (.toml or .json)"),
            );

        self.commands.iter().fold(app, |app, (name, cmd)| {
            // clap wants `&'static str` names; commands are registered once.
            let static_name: &'static str = Box::leak(name.clone().into_boxed_str());
            let sub = clap::Command::new(static_name).about(cmd.help().to_string());
            app.subcommand(cmd.add_arguments(sub))
        })
    }

    /// Dispatches to the subcommand selected in `matches`.
    pub async fn execute(
        &self,
        matches: &clap::ArgMatches,
        settings: &FormsetSettings,
        out: &mut Output,
    ) -> Result<(), FormsetError> {
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| {
            FormsetError::ConfigurationError("No subcommand specified".to_string())
        })?;

        let cmd = self.get(name).ok_or_else(|| {
            FormsetError::ConfigurationError(format!("Unknown command: {name}"))
        })?;

        tracing::debug!(command = name, "executing management command");
        cmd.handle(sub_matches, settings, out).await
    }
}

//! Built-in management commands.
//!
//! Each command implements the
//! [`ManagementCommand`](crate::command::ManagementCommand) trait.

pub mod actions;
pub mod check;
pub mod parse;

pub use actions::ActionsCommand;
pub use check::CheckCommand;
pub use parse::ParseCommand;

use crate::command::CommandRegistry;

/// Registers all built-in management commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(ParseCommand));
    registry.register(Box::new(CheckCommand));
    registry.register(Box::new(ActionsCommand));
}

/// The positional `expression` argument shared by `parse` and `check`.
pub(crate) fn expression_arg() -> clap::Arg {
    clap::Arg::new("expression")
        .required(true)
        .value_name("EXPRESSION")
        .help("Action expression, e.g. \"disable -> submit -> proceed !~ enable\"")
}

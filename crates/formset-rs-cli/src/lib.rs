//! # formset-rs-cli
//!
//! The `formset` command line tool for working with button action
//! expressions outside a page.
//!
//! - `formset parse EXPRESSION` prints the success and reject chains
//!   (`--json` for the syntax tree).
//! - `formset check EXPRESSION` reports syntax errors with their position,
//!   unknown names, invalid arguments, and likely mistakes.
//! - `formset actions` lists the built-in actions and value functions.
//!
//! Commands implement [`ManagementCommand`] and are collected in a
//! [`CommandRegistry`], so applications can add their own.
//!
//! ```rust
//! use formset_rs_cli::command::CommandRegistry;
//!
//! let registry = CommandRegistry::with_builtins();
//! assert_eq!(registry.list_commands(), vec!["actions", "check", "parse"]);
//! ```

// These clippy lints are intentionally allowed:
// - result_large_err: FormsetError is the framework-wide error type
// - doc_markdown: backtick requirements for documentation items are too strict
// - unused_async: command handlers maintain consistent async signatures
#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;
pub mod settings;

pub use command::{CommandRegistry, ManagementCommand, Output};
pub use commands::check::{run_checks, CheckLevel, CheckMessage};
pub use settings::load_settings;

//! # formset-rs
//!
//! Declarative button actions for formsets.
//!
//! A button carries an expression such as
//! `disable -> spinner -> submit -> okay(1500) -> proceed !~ enable -> bummer`.
//! It is parsed into a success chain and a reject chain, every name is
//! resolved against an action registry when the button is set up, and each
//! activation runs the steps in order as one async task.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `formset-rs` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ```rust
//! use formset_rs::actions::parse;
//!
//! let parsed = parse("disable -> submit -> proceed !~ enable").unwrap();
//! assert_eq!(parsed.success_chain.len(), 3);
//! assert_eq!(parsed.reject_chain.len(), 1);
//! ```

/// Error types, settings, configuration loading and logging.
pub use formset_rs_core as core;

/// Custom events and the listener registry buttons dispatch through.
#[cfg(feature = "events")]
pub use formset_rs_events as events;

/// Expression parser, action registry, built-in actions and the engine.
#[cfg(feature = "actions")]
pub use formset_rs_actions as actions;

/// The `formset` command line tool.
#[cfg(feature = "cli")]
pub use formset_rs_cli as cli;

/// Scripted formsets and event capture for tests.
#[cfg(feature = "testing")]
pub use formset_rs_test as test;

pub use async_trait::async_trait;
pub use serde_json;
pub use tokio;
pub use tracing;

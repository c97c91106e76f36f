//! # formset-rs-actions
//!
//! Button actions for formset-rs. A button's action attribute holds a small
//! expression such as
//!
//! ```text
//! disable -> submit({ mode: 'draft' }) -> okay(1500) -> proceed('/done/') !~ bummer -> enable
//! ```
//!
//! The expression is parsed ([`parser`]), resolved against an
//! [`ActionRegistry`] ([`builder`]) and run by a [`Button`] ([`engine`]),
//! one step at a time, on every activation.
//!
//! ## Modules
//!
//! - [`ast`] - Parsed chains, calls and argument values
//! - [`parser`] - The expression parser
//! - [`argument`] - Arguments bound at build time, with deferred value functions
//! - [`registry`] - Step contract and action registry
//! - [`builtin`] - The built-in actions
//! - [`builder`] - Chain resolution
//! - [`engine`] - Chain execution and activation outcomes
//! - [`element`] - The button element model
//! - [`formset`] - The formset collaborator
//! - [`button`] - The button controller

pub mod argument;
pub mod ast;
pub mod builder;
pub mod builtin;
pub mod button;
pub mod element;
pub mod engine;
pub mod formset;
pub mod parser;
pub mod registry;

pub use argument::BoundArgument;
pub use ast::{ActionCall, ActionChain, ArgumentValue, ParseResult};
pub use builder::{build, ResolvedChains, ResolvedStep};
pub use builtin::{register_builtin_actions, BuiltinAction};
pub use button::{Button, ButtonContext};
pub use element::ButtonElement;
pub use engine::{Activation, Outcome};
pub use formset::{Formset, Response};
pub use parser::parse;
pub use registry::{
    ActionFactory, ActionRegistry, ActionStep, Rejection, StepFailure, StepInput, StepResult,
};

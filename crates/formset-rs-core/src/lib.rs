//! # formset-rs-core
//!
//! Core types, settings, and error types for the formset-rs framework.
//! This crate has no framework dependencies and provides the foundation for
//! all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Framework settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{FormsetError, FormsetResult, ParseError};
pub use settings::{ButtonSettings, FormsetSettings, Reentrancy, SETTINGS};

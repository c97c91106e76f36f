//! # formset-rs-test
//!
//! Testing utilities for formset-rs. Provides formsets to attach buttons to
//! in tests and a log for the events buttons dispatch.
//!
//! ## Modules
//!
//! - [`recording`] - [`RecordingFormset`], answering from scripted replies
//! - [`router`] - [`RouterFormset`], posting JSON to an Axum application
//! - [`events`] - [`EventLog`], capturing dispatched events

pub mod events;
pub mod recording;
pub mod router;

pub use events::EventLog;
pub use recording::{FormsetCall, RecordingFormset, Reply};
pub use router::RouterFormset;

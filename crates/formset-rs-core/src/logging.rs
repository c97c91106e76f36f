//! Logging integration for the formset-rs framework.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`FormsetSettings`](crate::settings::FormsetSettings) and for creating
//! per-activation spans.

use crate::settings::FormsetSettings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug", "info",
/// "formset_rs_actions=trace"). In debug mode a pretty, human-readable format
/// is used; otherwise a structured JSON format is used. Installing a second
/// subscriber is silently ignored.
pub fn setup_logging(settings: &FormsetSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span covering one activation of a button.
///
/// # Examples
///
/// ```
/// use formset_rs_core::logging::activation_span;
///
/// let span = activation_span("submit-button", 1);
/// let _guard = span.enter();
/// tracing::debug!("running success chain");
/// ```
pub fn activation_span(element_id: &str, activation: u64) -> tracing::Span {
    tracing::info_span!("activation", element = element_id, seq = activation)
}

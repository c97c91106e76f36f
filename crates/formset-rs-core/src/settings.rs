//! Settings system for the formset-rs framework.
//!
//! This module provides the [`FormsetSettings`] struct, which holds all
//! framework configuration, and [`LazySettings`], a globally-accessible,
//! lazily-initialized settings instance.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// What the engine does when a button is activated while a previous
/// activation of the same button has not settled yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reentrancy {
    /// Run the new activation concurrently with the pending one.
    #[default]
    Allow,
    /// Skip the new activation.
    Ignore,
}

impl fmt::Display for Reentrancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

impl FromStr for Reentrancy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unknown reentrancy policy '{other}'")),
        }
    }
}

/// Per-button behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSettings {
    /// Whether buttons follow the formset's validity (`auto-disable`).
    pub auto_disable: bool,
    /// Policy for activations that overlap a pending one.
    pub reentrancy: Reentrancy,
    /// Class added by `spinner()`.
    pub spinner_class: String,
    /// Class set by `okay()`.
    pub okay_class: String,
    /// Class set by `bummer()`.
    pub bummer_class: String,
    /// Pause used by `okay()` when called without arguments, in milliseconds.
    pub okay_delay_ms: u64,
    /// Pause used by `bummer()` when called without arguments, in milliseconds.
    pub bummer_delay_ms: u64,
}

impl Default for ButtonSettings {
    fn default() -> Self {
        Self {
            auto_disable: false,
            reentrancy: Reentrancy::Allow,
            spinner_class: "dj-submitting".to_string(),
            okay_class: "dj-okay".to_string(),
            bummer_class: "dj-bummer".to_string(),
            okay_delay_ms: 0,
            bummer_delay_ms: 0,
        }
    }
}

impl ButtonSettings {
    /// All decorator classes managed by `spinner()`, `okay()` and `bummer()`.
    pub fn decorator_classes(&self) -> [&str; 3] {
        [
            self.spinner_class.as_str(),
            self.okay_class.as_str(),
            self.bummer_class.as_str(),
        ]
    }
}

/// The complete set of framework settings.
///
/// # Examples
///
/// ```
/// use formset_rs_core::settings::{FormsetSettings, Reentrancy};
///
/// let settings = FormsetSettings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.button.reentrancy, Reentrancy::Allow);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsetSettings {
    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The log level filter (e.g. "info", "formset_rs_actions=debug").
    pub log_level: String,
    /// Button behaviour.
    pub button: ButtonSettings,
    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for FormsetSettings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            button: ButtonSettings::default(),
            extra: HashMap::new(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup; afterwards
/// [`get`](LazySettings::get) returns the configured settings. Before that it
/// returns the defaults.
pub struct LazySettings {
    inner: OnceLock<FormsetSettings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called at most once, and
    /// before the first call to [`get`](LazySettings::get).
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured or read.
    pub fn configure(&self, settings: FormsetSettings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns the configured settings, falling back to (and freezing) the
    /// defaults when nothing was configured.
    pub fn get(&self) -> &FormsetSettings {
        self.inner.get_or_init(FormsetSettings::default)
    }

    /// Returns `true` if settings have been configured or read.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = FormsetSettings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert!(!s.button.auto_disable);
        assert_eq!(s.button.reentrancy, Reentrancy::Allow);
        assert_eq!(s.button.spinner_class, "dj-submitting");
        assert_eq!(s.button.okay_delay_ms, 0);
    }

    #[test]
    fn test_decorator_classes() {
        let s = ButtonSettings::default();
        assert_eq!(s.decorator_classes(), ["dj-submitting", "dj-okay", "dj-bummer"]);
    }

    #[test]
    fn test_reentrancy_from_str() {
        assert_eq!("allow".parse::<Reentrancy>().unwrap(), Reentrancy::Allow);
        assert_eq!(" IGNORE ".parse::<Reentrancy>().unwrap(), Reentrancy::Ignore);
        assert!("queue".parse::<Reentrancy>().is_err());
        assert_eq!(Reentrancy::Ignore.to_string(), "ignore");
    }

    #[test]
    fn test_lazy_settings_configure_and_get() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());

        let mut settings = FormsetSettings::default();
        settings.debug = false;
        settings.button.auto_disable = true;

        lazy.configure(settings);
        assert!(lazy.is_configured());
        assert!(!lazy.get().debug);
        assert!(lazy.get().button.auto_disable);
    }

    #[test]
    fn test_lazy_settings_get_falls_back_to_defaults() {
        let lazy = LazySettings::new();
        assert!(lazy.get().debug);
        assert!(lazy.is_configured());
    }

    #[test]
    #[should_panic(expected = "already been configured")]
    fn test_lazy_settings_double_configure_panics() {
        let lazy = LazySettings::new();
        lazy.configure(FormsetSettings::default());
        lazy.configure(FormsetSettings::default());
    }
}

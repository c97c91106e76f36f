//! Reading [`FormsetSettings`] from TOML, JSON and the environment.
//!
//! A file only needs the keys it changes: it is laid over the defaults table
//! by table, and `FORMSET_*` variables are applied last by the `_with_env`
//! loaders and [`from_env`].
//!
//! ## Environment variables
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMSET_DEBUG` | `debug` |
//! | `FORMSET_LOG_LEVEL` | `log_level` |
//! | `FORMSET_AUTO_DISABLE` | `button.auto_disable` |
//! | `FORMSET_REENTRANCY` | `button.reentrancy` (`allow` or `ignore`) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use formset_rs_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("formset.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::FormsetError;
use crate::settings::FormsetSettings;

/// Parses TOML settings.
///
/// Any fields not present in the TOML keep their default values, including
/// individual keys of nested tables such as `[button]`.
pub fn from_toml_str(toml_str: &str) -> Result<FormsetSettings, FormsetError> {
    let layer: serde_json::Value = toml::from_str(toml_str)
        .map_err(|e| FormsetError::ConfigurationError(format!("Invalid TOML settings: {e}")))?;
    merge_over_defaults(layer, "TOML")
}

/// Reads TOML settings from `path`.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<FormsetSettings, FormsetError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// [`from_toml_file`], then the `FORMSET_*` overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<FormsetSettings, FormsetError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Parses JSON settings.
pub fn from_json_str(json_str: &str) -> Result<FormsetSettings, FormsetError> {
    let layer: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormsetError::ConfigurationError(format!("Invalid JSON settings: {e}")))?;
    merge_over_defaults(layer, "JSON")
}

/// Reads JSON settings from `path`.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<FormsetSettings, FormsetError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// [`from_json_file`], then the `FORMSET_*` overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<FormsetSettings, FormsetError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// The defaults with the `FORMSET_*` overrides applied.
pub fn from_env() -> Result<FormsetSettings, FormsetError> {
    let mut settings = FormsetSettings::default();
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Applies the `FORMSET_*` variables that are set to `settings`.
///
/// Boolean variables accept "true"/"1"/"yes" (case-insensitive) as true and
/// anything else as false. An unknown `FORMSET_REENTRANCY` value is a
/// configuration error.
pub fn apply_env_overrides(settings: &mut FormsetSettings) -> Result<(), FormsetError> {
    if let Ok(val) = std::env::var("FORMSET_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("FORMSET_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("FORMSET_AUTO_DISABLE") {
        settings.button.auto_disable = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("FORMSET_REENTRANCY") {
        settings.button.reentrancy = val.parse().map_err(|e| {
            FormsetError::ConfigurationError(format!("FORMSET_REENTRANCY: {e}"))
        })?;
    }

    Ok(())
}

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path, format: &str) -> Result<String, FormsetError> {
    std::fs::read_to_string(path).map_err(|e| {
        FormsetError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(
    layer: serde_json::Value,
    format: &str,
) -> Result<FormsetSettings, FormsetError> {
    let mut settings = serde_json::to_value(FormsetSettings::default())
        .map_err(|e| FormsetError::SerializationError(e.to_string()))?;
    overlay(&mut settings, layer);
    serde_json::from_value(settings).map_err(|e| {
        FormsetError::ConfigurationError(format!("Unusable {format} settings: {e}"))
    })
}

/// Overlays `layer` onto `target`, table by table; any non-table value in
/// `layer` replaces what was there.
fn overlay(target: &mut serde_json::Value, layer: serde_json::Value) {
    match (target, layer) {
        (serde_json::Value::Object(target), serde_json::Value::Object(layer)) => {
            for (key, value) in layer {
                match target.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

//! Settings resolution for the `formset` binary.

use std::path::Path;

use formset_rs_core::settings_loader;
use formset_rs_core::{FormsetError, FormsetSettings};

/// Loads settings from `path` when given, choosing the format by extension,
/// or from defaults otherwise. `FORMSET_*` environment variables override
/// either.
pub fn load_settings(path: Option<&Path>) -> Result<FormsetSettings, FormsetError> {
    let Some(path) = path else {
        return settings_loader::from_env();
    };
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => settings_loader::from_toml_file_with_env(path),
        Some("json") => settings_loader::from_json_file_with_env(path),
        _ => Err(FormsetError::ConfigurationError(format!(
            "Unsupported settings file: {} (expected .toml or .json)",
            path.display()
        ))),
    }
}

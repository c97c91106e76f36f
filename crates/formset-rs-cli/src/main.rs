use std::path::Path;
use std::process::ExitCode;

use formset_rs_cli::{load_settings, CommandRegistry};
use formset_rs_core::logging::setup_logging;
use formset_rs_core::settings::SETTINGS;

#[tokio::main]
async fn main() -> ExitCode {
    let registry = CommandRegistry::with_builtins();
    let matches = registry.build_cli().get_matches();

    let settings_path = matches.get_one::<String>("settings").map(Path::new);
    let settings = match load_settings(settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&settings);
    SETTINGS.configure(settings.clone());

    let mut stdout = std::io::stdout();
    match registry.execute(&matches, &settings, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

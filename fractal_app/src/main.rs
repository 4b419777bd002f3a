//! hwfractal launcher
//!
//! Opens the window, brings up Vulkan on the chosen device and polls window
//! events until the window is closed.
//!
//! Usage: `hwfractal [config.toml|config.ron]`. Without an argument
//! `hwfractal.toml` is read when present.

use hwfractal::foundation::logging;
use hwfractal::prelude::*;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_CONFIG: &str = "hwfractal.toml";

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|path| path.exists()))
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, ConfigError> {
    path.map_or_else(|| Ok(AppConfig::default()), |path| AppConfig::load_from_file(path))
}

fn run(config: &AppConfig, path: Option<&PathBuf>) -> Result<(), AppError> {
    let interactive = std::io::stdin().is_terminal();
    let mut app = if interactive {
        VulkanApplication::new(config, &mut ConsoleChooser::stdio())?
    } else {
        log::info!("No terminal attached, choosing device automatically");
        VulkanApplication::new(config, &mut SuitabilityChooser)?
    };

    if let Some(path) = path {
        config.remember_device_choice(path, app.selection().index, interactive);
    }

    app.run();
    Ok(())
}

fn main() -> ExitCode {
    let path = config_path();
    let config = match load_config(path.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = config.log_level_filter().unwrap_or(logging::LevelFilter::Info);
    logging::init(level);

    match &path {
        Some(path) => log::info!("Starting {} with {}", config.title, path.display()),
        None => log::info!("Starting {} with default settings", config.title),
    }

    match run(&config, path.as_ref()) {
        Ok(()) => {
            log::info!("{} finished successfully", config.title);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Application error: {}", e);
            ExitCode::FAILURE
        }
    }
}

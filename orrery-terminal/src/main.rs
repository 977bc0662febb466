/// Orrery Terminal - textured bodies orbiting a sun
///
/// Reads `orrery.toml` from the working directory when present.
/// Controls:
///   - WASD: Move
///   - Space / C (or Left Shift): Up / Down
///   - Arrow Keys: Look around
///   - Q/ESC: Quit
use log::{error, LevelFilter};
use orrery_core::config::DEFAULT_CONFIG_PATH;
use orrery_core::{ViewerConfig, ViewerError};
use std::process::ExitCode;

fn load_and_run() -> Result<u64, ViewerError> {
    let config = ViewerConfig::load_or_default(DEFAULT_CONFIG_PATH)?;
    orrery_terminal::run(&config)
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();

    match load_and_run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("orrery: {}", e);
            ExitCode::FAILURE
        }
    }
}

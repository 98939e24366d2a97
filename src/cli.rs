use crate::config::{BuildConfig, Config};
use crate::error::Result;
use simplelog::LevelFilter;
use std::path::Path;

fn select_log_level_filter(verbosity: i32) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init_logging(verbosity: i32) -> std::result::Result<(), log::SetLoggerError> {
    simplelog::TermLogger::init(
        select_log_level_filter(verbosity),
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
}

/// Reads the build settings from a config file, or falls back to defaults.
pub fn load_build_config<P: AsRef<Path>>(path: Option<P>) -> Result<BuildConfig> {
    match path {
        Some(path) => {
            let config = Config::load(path.as_ref())?;
            log::info!("Loaded config from {:?}", path.as_ref());
            Ok(config.into_build())
        }
        None => Ok(BuildConfig::default()),
    }
}

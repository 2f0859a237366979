//! Logging helpers
//!
//! `RUST_LOG` takes precedence over the configured level. Without it the
//! logger lets everything through and the level is enforced with
//! `log::set_max_level`, so it can still change once the configuration
//! file has been read.

use std::env;
use std::str::FromStr;

use log::LevelFilter;

/// Initialize the logging system
///
/// # Parameters
///
/// * `level` - Log level to start with when `RUST_LOG` is unset
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", "trace");

    // Logs go to stderr so the response on stdout stays clean
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .try_init();

    set_log_level(level);
}

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`)
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(level.trim()).ok()
}

/// Apply `level` as the maximum log level
///
/// Returns the level now in effect. Unknown names and a set `RUST_LOG`
/// leave the current level untouched.
pub fn set_log_level(level: &str) -> LevelFilter {
    if env::var_os("RUST_LOG").is_some() {
        return log::max_level();
    }

    match parse_level(level) {
        Some(filter) => log::set_max_level(filter),
        None => log::warn!("Invalid log level: {}, keeping {}", level, log::max_level()),
    }

    log::max_level()
}

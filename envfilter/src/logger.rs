// envfilter/src/logger.rs
//! Logger initialization for the CLI.

use log::LevelFilter;

/// Initializes `env_logger` for the process.
///
/// `RUST_LOG` is honoured unless an explicit level is given. Logs go to
/// stderr so stdout stays reserved for command output. Calling this more
/// than once is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).format_target(false);
    let _ = builder.try_init();
}

/// Picks the log level implied by the `--quiet` and `--debug` flags.
pub fn level_from_flags(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}

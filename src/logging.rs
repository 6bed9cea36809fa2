use log::{info, log_enabled, Level, LevelFilter};

/// Initializes `env_logger` with an explicit default level.
///
/// `RUST_LOG` still overrides the level when present. Calling this more than
/// once is harmless: later calls are ignored.
pub fn init_logger_with_level(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

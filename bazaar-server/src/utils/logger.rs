//! Logging Infrastructure
//!
//! tracing-based structured logging. The filter honors `RUST_LOG` when set,
//! falling back to the configured level; production deployments can add a
//! daily-rolling file appender via `LOG_DIR`.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger with stdout output
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger, optionally writing to a daily-rolling log file
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or("info")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_dir {
        Some(dir) if Path::new(dir).exists() => {
            let appender = tracing_appender::rolling::daily(dir, "bazaar-server");
            builder.with_writer(appender).with_ansi(false).init();
        }
        Some(dir) => {
            builder.init();
            tracing::warn!(dir, "Log directory does not exist, logging to stdout");
        }
        None => builder.init(),
    }
}

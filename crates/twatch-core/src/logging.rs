//! Logging configuration using tracing
//!
//! Stdout carries the headless NDJSON stream, so logs only ever go to a
//! daily-rolling file.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Filter directive variable
pub const LOG_FILTER_ENV: &str = "TWATCH_LOG";

/// Overrides the log directory
pub const LOG_DIR_ENV: &str = "TWATCH_LOG_DIR";

/// Default filter when `TWATCH_LOG` is unset
const DEFAULT_FILTER: &str = "transit_watch=info,twatch_app=info,twatch_transit=info,warn";

const LOG_FILE_PREFIX: &str = "twatch.log";

/// Initialize the logging subsystem
///
/// Logs go to `<data dir>/transit-watch/logs/` unless `TWATCH_LOG_DIR` is set.
///
/// # Examples
/// ```bash
/// TWATCH_LOG=debug twatch
/// TWATCH_LOG=twatch_app::feed=trace TWATCH_LOG_DIR=/tmp/twatch twatch
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(fmt::time::ChronoLocal::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    tracing::info!(
        "Transit Watch {} logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );
    Ok(())
}

/// Resolve the log directory
pub fn log_directory() -> PathBuf {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("transit-watch")
        .join("logs")
}

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE: &str = "docchat.log";

pub fn log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("docchat").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Initialize file logging for TUI mode.
///
/// There is no stdout layer: ratatui owns the terminal in raw/alternate-screen
/// mode. `RUST_LOG` wins over `default_filter`. The returned guard must be
/// kept alive so buffered lines are flushed on shutdown.
pub fn init(default_filter: &str) -> Result<(WorkerGuard, PathBuf)> {
    let log_dir = log_dir();
    fs::create_dir_all(&log_dir)?;

    // Daily rotation, no size limit
    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(file_layer).try_init()?;

    Ok((guard, log_dir.join(LOG_FILE)))
}

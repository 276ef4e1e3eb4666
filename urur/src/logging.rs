use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with file-based logging
/// Logs are written to ~/.urur/logs/urur-YYYY-MM-DD-HH-MM-SS.log
/// Keep the returned guard alive until exit so buffered lines are flushed
pub fn init_logging() -> Result<(PathBuf, WorkerGuard)> {
    // Create logs directory
    let logs_dir = urur_auth::config_dir()?.join("logs");
    std::fs::create_dir_all(&logs_dir)?;

    // Create timestamped log file name
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let log_filename = format!("urur-{}.log", timestamp);
    let log_path = logs_dir.join(&log_filename);

    // Create file appender (non-blocking, flushed when the guard drops)
    let file_appender = tracing_appender::rolling::never(&logs_dir, &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Set up formatting layer for file output. The terminal belongs to
    // prompts and spinners, so nothing goes to stderr
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log file
        .with_target(true)
        .with_line_number(true);

    // Set up filter (default to INFO, can be overridden with RUST_LOG env var)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Initialize subscriber
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()?;

    Ok((log_path, guard))
}

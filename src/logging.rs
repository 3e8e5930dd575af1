//! Logging infrastructure for the tool host.
//!
//! Logs go to stderr and, unless disabled, to daily-rotated files in the app
//! data directory. Stdout is never written to: it carries the tool protocol.
//!
//! ```no_run
//! use data_explorer::logging::{self, LoggingOptions};
//!
//! logging::init(&LoggingOptions::default()).expect("Failed to initialize logging");
//! tracing::info!("Host started");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub file_logging: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            file_logging: true,
            log_dir: None,
        }
    }
}

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/data-explorer/logs`
/// - macOS: `~/Library/Application Support/data-explorer/logs`
/// - Linux: `~/.local/share/data-explorer/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(base_dir.join("data-explorer").join("logs"))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Initializes the logging system.
///
/// File output creates `data-explorer.<date>.log` (all levels) and
/// `error.<date>.log` (warnings and errors), both rotated daily with ten files
/// retained.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or an appender fails
pub fn init(options: &LoggingOptions) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let (all_logs_layer, error_logs_layer, log_dir) = if options.file_logging {
        let log_dir = match &options.log_dir {
            Some(dir) => dir.clone(),
            None => get_log_dir()?,
        };
        ensure_dir(&log_dir)?;

        let all_logs_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .max_log_files(10)
            .filename_prefix("data-explorer")
            .filename_suffix("log")
            .build(&log_dir)
            .context("Failed to create all-logs file appender")?;

        let error_logs_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .max_log_files(10)
            .filename_prefix("error")
            .filename_suffix("log")
            .build(&log_dir)
            .context("Failed to create error-logs file appender")?;

        let all_logs_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(all_logs_appender);

        let error_logs_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(error_logs_appender)
            .with_filter(EnvFilter::new("warn"));

        (Some(all_logs_layer), Some(error_logs_layer), Some(log_dir))
    } else {
        (None, None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    match log_dir {
        Some(dir) => tracing::info!("Logging initialized, log directory: {}", dir.display()),
        None => tracing::info!("Logging initialized (stderr only)"),
    }

    Ok(())
}

/// Records a tagged operational event.
pub fn log_event(tag: &str, details: &str) {
    tracing::info!(tag, "{details}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_dir() {
        let log_dir = get_log_dir().expect("Failed to get log dir");
        assert!(
            log_dir.ends_with("data-explorer/logs") || log_dir.ends_with("data-explorer\\logs"),
            "unexpected log dir {}",
            log_dir.display()
        );
    }
}

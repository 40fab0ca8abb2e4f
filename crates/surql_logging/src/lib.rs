//! Shared logging setup for the surql binaries.
//!
//! Two layers: a daily-rotated file under `$SURQL_HOME/logs` written through
//! a non-blocking worker, and stderr. stdout stays free for command output.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "surql=info,surql_backend=info,surql_datasource=info";
/// Daily files kept before the oldest is removed.
const MAX_LOG_FILES: usize = 7;

/// Logging configuration shared by surql binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of warnings only
    pub verbose: bool,
    /// Errors only on stderr (stdout carries machine-readable output)
    pub quiet: bool,
}

/// Keeps the file writer flushing; hold it until the program exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize tracing with a rolling file writer and stderr output.
///
/// A log directory that cannot be created only disables the file layer.
pub fn init_logging(config: LogConfig<'_>) -> Result<LoggingGuard> {
    let mut file_guard = None;
    let file_layer = match ensure_logs_dir().and_then(|dir| file_appender(&dir, config.app_name)) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter()),
            )
        }
        Err(err) => {
            eprintln!("Warning: file logging disabled: {:#}", err);
            None
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter(config.verbose, config.quiet)),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LoggingGuard { _file: file_guard })
}

/// `RUST_LOG` when set, else the surql crates at info.
fn file_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn console_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        file_filter()
    } else {
        EnvFilter::new("warn")
    }
}

/// `<dir>/<app>.<date>.log`, rotated daily.
fn file_appender(dir: &Path, app_name: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(app_name)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .with_context(|| format!("Failed to open log file for {}", app_name))
}

/// Get the surql home directory: `$SURQL_HOME` or `~/.surql`.
pub fn surql_home() -> PathBuf {
    resolve_home(std::env::var_os("SURQL_HOME").map(PathBuf::from), dirs::home_dir())
}

fn resolve_home(override_path: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    match override_path.filter(|path| !path.as_os_str().is_empty()) {
        Some(path) => path,
        None => home.unwrap_or_else(std::env::temp_dir).join(".surql"),
    }
}

/// Get the logs directory: ~/.surql/logs
pub fn logs_dir() -> PathBuf {
    surql_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

//! Logging infrastructure.
//!
//! One `tracing` subscriber feeds two sinks: a non-blocking file
//! appender under the log directory, and stderr (stdout belongs to the
//! hook protocol). `RUST_LOG` overrides the default `info` filter.

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter applied when RUST_LOG is unset.
const DEFAULT_FILTER: &str = "info";

/// Keeps the file writer alive.
///
/// Dropping the guard flushes buffered records and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Installs the global subscriber, logging to `log_dir/log_file` and
/// stderr.
///
/// The log directory is created (recursively) when missing; on failure
/// an error is returned and no subscriber is installed.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    let (file_sink, file_guard) = open_file_sink(Path::new(log_dir), log_file)?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_sink)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Opens the non-blocking file sink, creating its directory first.
fn open_file_sink(dir: &Path, file: &str) -> Result<(NonBlocking, WorkerGuard), io::Error> {
    fs::create_dir_all(dir)?;
    Ok(tracing_appender::non_blocking(
        tracing_appender::rolling::never(dir, file),
    ))
}

/// `RUST_LOG` when set and parseable, the default filter otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Get the default log directory path.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// Get the default log file name.
pub fn default_log_file() -> &'static str {
    "pgcache.log"
}

//! Tracing setup shared by every binary in the workspace.
//!
//! Events always go to a daily rolling file. Stdout output is opt-in through
//! `LOG_TO_STDOUT`, mirroring how the server binaries are run in development.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Splits a configured log file path into the directory the rolling appender
/// writes into and the file name prefix it uses.
///
/// A bare file name (`"campus.log"`) is placed under `logs/`.
pub fn split_log_path(log_file: &str) -> (PathBuf, String) {
    let path = Path::new(log_file);
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "campus.log".to_string());

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("logs"),
    };

    (dir, file_name)
}

/// Installs the global tracing subscriber.
///
/// # Arguments
/// * `log_file` - Path of the log file; its parent directory is created if missing.
/// * `log_level` - Fallback filter used when `LOG_LEVEL` cannot be parsed from the environment.
/// * `log_to_stdout` - Also emit ANSI-coloured events to stdout.
///
/// # Returns
/// The non-blocking writer guard. Dropping it flushes and stops file logging,
/// so callers keep it alive for the lifetime of `main`.
pub fn init_logging(log_file: &str, log_level: &str, log_to_stdout: bool) -> WorkerGuard {
    let (dir, file_name) = split_log_path(log_file);
    fs::create_dir_all(&dir).ok();

    let file_appender = rolling::daily(&dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    // A second init (e.g. from tests) keeps the first subscriber.
    let installed = if log_to_stdout {
        let stdout_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(true);
        registry.with(stdout_layer).try_init()
    } else {
        registry.try_init()
    };

    if installed.is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }

    guard
}

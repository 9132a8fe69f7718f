//! Diagnostic logging to a file
//!
//! The dashboard owns stdout, so every event goes to a log file through a
//! non-blocking writer.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize file logging
///
/// `RUST_LOG` wins over `level` when set. Keep the returned guard alive for the
/// program lifetime or buffered lines are lost.
pub fn init_file_logging(path: &Path, level: &str) -> Result<WorkerGuard> {
    let (directory, file_name) = split_log_path(path)?;
    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(level)?)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init()
        .context("Failed to install the log subscriber")?;

    Ok(guard)
}

/// Filter from `RUST_LOG`, falling back to `level`
fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level '{}'", level)),
    }
}

/// Directory and file name for the appender; a bare name lands in the working directory
fn split_log_path(path: &Path) -> Result<(PathBuf, OsString)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log path '{}' has no file name", path.display()))?
        .to_os_string();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bare_file_name() {
        let (directory, file) = split_log_path(Path::new("kmet.log")).unwrap();
        assert_eq!(directory, PathBuf::from("."));
        assert_eq!(file, OsString::from("kmet.log"));
    }

    #[test]
    fn test_split_nested_path() {
        let (directory, file) = split_log_path(Path::new("/var/log/kmet/debug.log")).unwrap();
        assert_eq!(directory, PathBuf::from("/var/log/kmet"));
        assert_eq!(file, OsString::from("debug.log"));
    }

    #[test]
    fn test_split_rejects_directory_only() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}

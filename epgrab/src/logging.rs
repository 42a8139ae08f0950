//! Logging infrastructure for the grabber.
//!
//! Writes to a log file under the config directory (daily-rotated when the
//! retention policy enables rotation) and optionally mirrors to stdout for
//! interactive runs. Verbosity follows RUST_LOG when set, otherwise the
//! debug flag picks between `debug` and `info`.

use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::config_directory;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global logging subscriber.
///
/// * `rotate` - daily file rotation, per the retention policy
/// * `console` - mirror log output to stdout
/// * `debug` - default to debug verbosity when RUST_LOG is unset
///
/// Returns a guard that must be kept alive for logging to work.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    rotate: bool,
    console: bool,
    debug: bool,
) -> Result<LoggingGuard, io::Error> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = if rotate {
        tracing_appender::rolling::daily(log_dir, log_file)
    } else {
        tracing_appender::rolling::never(log_dir, log_file)
    };
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
    });

    let default_level = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Delete rotated log files beyond the retention count.
///
/// Rotated files are named `{log_file}.{date}`; the date suffix sorts
/// chronologically, so the lexicographically smallest files are the oldest.
/// `keep_files` of 0 means unlimited. Returns the number of files removed.
pub fn prune_rotated_logs(
    log_dir: &Path,
    log_file: &str,
    keep_files: u32,
) -> Result<usize, io::Error> {
    if keep_files == 0 {
        return Ok(0);
    }

    let prefix = format!("{}.", log_file);
    let mut rotated: Vec<PathBuf> = std::fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect();

    if rotated.len() <= keep_files as usize {
        return Ok(0);
    }

    rotated.sort();
    let excess = rotated.len() - keep_files as usize;
    let mut removed = 0;
    for path in rotated.into_iter().take(excess) {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed rotated log: {}", path.display());
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove rotated log {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

/// Default log directory (~/.epgrab/log).
pub fn default_log_dir() -> PathBuf {
    config_directory().join("log")
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "epgrab.log"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        assert!(default_log_dir().ends_with("log"));
        assert_eq!(default_log_file(), "epgrab.log");
    }

    #[test]
    fn test_prune_keeps_newest_files() {
        let dir = TempDir::new().unwrap();
        for date in ["2026-08-01", "2026-08-02", "2026-08-03", "2026-08-04"] {
            std::fs::write(dir.path().join(format!("epgrab.log.{}", date)), "x").unwrap();
        }
        // The active file has no date suffix and is never pruned
        std::fs::write(dir.path().join("epgrab.log"), "x").unwrap();

        let removed = prune_rotated_logs(dir.path(), "epgrab.log", 2).unwrap();
        assert_eq!(removed, 2);

        assert!(!dir.path().join("epgrab.log.2026-08-01").exists());
        assert!(!dir.path().join("epgrab.log.2026-08-02").exists());
        assert!(dir.path().join("epgrab.log.2026-08-03").exists());
        assert!(dir.path().join("epgrab.log.2026-08-04").exists());
        assert!(dir.path().join("epgrab.log").exists());
    }

    #[test]
    fn test_prune_zero_means_unlimited() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("epgrab.log.2026-08-01"), "x").unwrap();

        let removed = prune_rotated_logs(dir.path(), "epgrab.log", 0).unwrap();
        assert_eq!(removed, 0);
        assert!(dir.path().join("epgrab.log.2026-08-01").exists());
    }

    #[test]
    fn test_prune_under_limit_removes_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("epgrab.log.2026-08-01"), "x").unwrap();

        let removed = prune_rotated_logs(dir.path(), "epgrab.log", 5).unwrap();
        assert_eq!(removed, 0);
    }

    // Note: init_logging installs a global subscriber that can only be set
    // once per process, so actual log output is exercised manually and via
    // the CLI rather than in unit tests.
}

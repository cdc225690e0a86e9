// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature and
//! `LoggingConfig::file_logging`, also a daily rotating JSON file inside a
//! timestamped run folder:
//!
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── spikegrid.log.2025-01-01
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps file writers alive; logs are flushed when dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder receiving log files, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Map config-style level names onto `EnvFilter` ones
pub fn normalize_level(level: &str) -> String {
    match level.trim().to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "" => "info".to_string(),
        other => other.to_string(),
    }
}

/// Filter for the configured base level plus per-crate debug flags
pub fn build_filter(debug_flags: &CrateDebugFlags, level: &str) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(&normalize_level(level));
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives: {}", directives))
}

/// Folder name for a run started at `started`
pub fn run_folder_name(started: DateTime<Utc>) -> String {
    format!("{}{}", RUN_PREFIX, started.format(RUN_TIMESTAMP_FORMAT))
}

/// Delete all but the `keep` most recent run folders in `base_log_dir`.
///
/// Returns the number of folders removed. Entries that are not run folders
/// are left alone.
pub fn cleanup_old_runs(base_log_dir: &Path, keep: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to list log directory: {}", base_log_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(RUN_PREFIX))
            .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).ok());
        if let Some(started) = started {
            runs.push((path, started));
        }
    }

    // Newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in runs.iter().skip(keep) {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove old log directory: {}", path.display()))?;
        removed += 1;
    }
    Ok(removed)
}

fn console_layer(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<BoxedLayer> {
    let filter = build_filter(debug_flags, &config.level)?;
    let layer = match config.format {
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_filter(filter)
            .boxed(),
    };
    Ok(layer)
}

#[cfg(feature = "file-logging")]
fn file_layer(
    debug_flags: &CrateDebugFlags,
    config: &LoggingConfig,
) -> Result<(BoxedLayer, tracing_appender::non_blocking::WorkerGuard, PathBuf)> {
    let run_folder = config.log_dir.join(run_folder_name(Utc::now()));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    cleanup_old_runs(&config.log_dir, config.retention_runs.max(1))?;

    let appender = tracing_appender::rolling::daily(&run_folder, "spikegrid.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(build_filter(debug_flags, &config.level)?)
        .boxed();
    Ok((layer, guard, run_folder))
}

/// Install the global subscriber
///
/// # Errors
/// Fails on invalid level names, on file-system errors for the run folder,
/// when file logging is requested without the `file-logging` feature, and when
/// a global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(debug_flags, config)?];

    #[cfg(feature = "file-logging")]
    let (file_guard, log_dir) = if config.file_logging {
        let (layer, guard, run_folder) = file_layer(debug_flags, config)?;
        layers.push(layer);
        (Some(guard), Some(run_folder))
    } else {
        (None, None)
    };

    #[cfg(not(feature = "file-logging"))]
    let log_dir: Option<PathBuf> = if config.file_logging {
        anyhow::bail!("File logging requested, but spikegrid-observability was built without the 'file-logging' feature");
    } else {
        None
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guard: file_guard,
        log_dir,
    })
}

/// Initialize console logging at `info` with the given debug flags
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("WARNING"), "warn");
        assert_eq!(normalize_level(" Debug "), "debug");
        assert_eq!(normalize_level(""), "info");
    }

    #[test]
    fn test_build_filter() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-spikegrid-npu-engine".to_string()]);
        assert!(build_filter(&flags, "info").is_ok());
        assert!(build_filter(&flags, "not a level=").is_err());
    }

    #[test]
    fn test_run_folder_name() {
        let started = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(run_folder_name(started), "run_20250304_050607");
    }

    #[test]
    fn test_cleanup_keeps_newest_runs() {
        let dir = tempdir().unwrap();
        let names = [
            "run_20250101_000000",
            "run_20250103_000000",
            "run_20250102_000000",
            "run_20250104_000000",
            "notes",
        ];
        for name in names {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }

        let removed = cleanup_old_runs(dir.path(), 2).unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("run_20250104_000000").exists());
        assert!(dir.path().join("run_20250103_000000").exists());
        assert!(!dir.path().join("run_20250102_000000").exists());
        assert!(!dir.path().join("run_20250101_000000").exists());
        assert!(dir.path().join("notes").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempdir().unwrap();
        assert_eq!(cleanup_old_runs(&dir.path().join("absent"), 3).unwrap(), 0);
    }
}

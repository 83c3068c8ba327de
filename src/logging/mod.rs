use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{Level, Subscriber, debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::config::GeneralConfig;

const LOG_FILE_NAME: &str = "media-device-select.log";

/// Logging configuration
pub struct LoggingConfig {
    pub level: Level,
    pub file_output: bool,
    pub console_output: bool,
    pub log_dir: Option<PathBuf>,
    pub json_format: bool,
    /// Prune rotated files older than this many days when file output starts
    pub retention_days: Option<u64>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_output: false,
            console_output: true,
            log_dir: None,
            json_format: false,
            retention_days: None,
        }
    }
}

impl LoggingConfig {
    /// Console-only logging at `level` (e.g. "debug"); unknown levels fall back to info
    pub fn console(level: &str) -> Self {
        Self {
            level: Level::from_str(level).unwrap_or(Level::INFO),
            ..Self::default()
        }
    }

    /// Logging as configured in `[general]`; `verbose` forces debug
    pub fn from_general(general: &GeneralConfig, verbose: bool) -> Self {
        let level = if verbose { "debug" } else { general.log_level.as_str() };
        Self {
            file_output: general.log_to_file,
            log_dir: general.log_dir.clone(),
            retention_days: Some(general.log_retention_days),
            ..Self::console(level)
        }
    }

    pub fn filter_directive(&self) -> String {
        format!(
            "media_device_select={}",
            self.level.as_str().to_lowercase()
        )
    }
}

fn format_layer<S, W>(
    writer: W,
    json: bool,
    with_location: bool,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_target(true);
    if json {
        layer
            .json()
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        layer
            .with_ansi(ansi)
            .with_file(with_location)
            .with_line_number(with_location)
            .boxed()
    }
}

/// Initialize logging with optional file rotation and structured output
///
/// Returns a tuple of (WorkerGuard, log_dir); keep the guard alive so
/// buffered file output is flushed. Expired log files are pruned before the
/// day's file is opened.
pub fn initialize_logging(config: LoggingConfig) -> Result<(Option<WorkerGuard>, Option<PathBuf>)> {
    let mut layers = Vec::new();
    let mut guard = None;
    let mut pruned = 0;

    if config.console_output {
        layers.push(format_layer(std::io::stderr, config.json_format, false, true));
    }

    let log_dir = if config.file_output {
        let dir = match config.log_dir.clone() {
            Some(dir) => dir,
            None => get_default_log_dir()?,
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        if let Some(days) = config.retention_days {
            pruned = cleanup_old_logs(&dir, days)?;
        }

        // Daily rotation
        let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_NAME);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);
        layers.push(format_layer(non_blocking, config.json_format, true, false));

        Some(dir)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(config.filter_directive()))
        .with(layers)
        .try_init()?;

    if let Some(dir) = &log_dir {
        info!("Logging to {}", dir.display());
        if pruned > 0 {
            info!("Removed {} expired log files", pruned);
        }
    }

    Ok((guard, log_dir))
}

/// Get the default log directory path
pub fn get_default_log_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
    Ok(home_dir.join(".local/share/media-device-select/logs"))
}

/// Remove rotated log files older than `keep_days`. Returns how many were removed.
pub fn cleanup_old_logs(log_dir: &Path, keep_days: u64) -> Result<usize> {
    use std::time::{Duration, SystemTime};

    let cutoff_time = SystemTime::now() - Duration::from_secs(60 * 60 * 24 * keep_days);

    if !log_dir.exists() {
        return Ok(0);
    }

    let mut cleaned_count = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_NAME));
        if !path.is_file() || !is_log {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };

        if modified < cutoff_time {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove old log file {}: {}", path.display(), e);
            } else {
                cleaned_count += 1;
                debug!("Removed old log file: {}", path.display());
            }
        }
    }

    Ok(cleaned_count)
}

//! Logging system initialization
//!
//! Sets up tracing-based logging with file output to `regscope.log` and
//! rotation on every initialization, keeping `max_files` previous sessions.

use crate::config::{ConfigManager, LoggingConfig};
use crate::error::{RegScopeError, Result, StringError};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

const LOG_PREFIX: &str = "regscope";
const LOG_SUFFIX: &str = "log";

/// Initialize the global tracing subscriber
///
/// The filter comes from `RUST_LOG` when set, otherwise from `config.level`.
/// Logs go to `config.directory`, or the application data directory when unset.
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let log_dir = config
        .directory
        .clone()
        .unwrap_or_else(ConfigManager::data_dir);
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(format!("{LOG_PREFIX}.{LOG_SUFFIX}"));
    rotate_logs(&log_path, config.max_files)?;

    // Rotation happens above, once per session
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .build(&log_dir)
        .map_err(|e| RegScopeError::ConfigError(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level)),
        )
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| RegScopeError::ConfigError(Box::new(e)))?;

    tracing::info!(
        "regscope v{} logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_path.display()
    );

    Ok(())
}

/// Shift `log_path` into the numbered history
///
/// `regscope.log.{max_files}` is deleted, `.N` moves to `.N+1`, and the
/// current log becomes `.1`. With `max_files == 0` the current log is deleted.
pub(crate) fn rotate_logs(log_path: &Path, max_files: u8) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    if max_files == 0 {
        std::fs::remove_file(log_path)?;
        return Ok(());
    }

    let log_dir = log_path
        .parent()
        .ok_or_else(|| RegScopeError::ConfigError(StringError::new("Invalid log path")))?;
    let log_name = log_path
        .file_name()
        .ok_or_else(|| RegScopeError::ConfigError(StringError::new("Invalid log filename")))?
        .to_string_lossy();

    let oldest_log = log_dir.join(format!("{log_name}.{max_files}"));
    if oldest_log.exists() {
        std::fs::remove_file(&oldest_log)?;
    }

    for i in (1..max_files).rev() {
        let current_log = log_dir.join(format!("{log_name}.{i}"));
        if current_log.exists() {
            std::fs::rename(&current_log, log_dir.join(format!("{log_name}.{}", i + 1)))?;
        }
    }

    std::fs::rename(log_path, log_dir.join(format!("{log_name}.1")))?;
    Ok(())
}

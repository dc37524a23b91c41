use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "xcord.log";
const DEFAULT_FILTER: &str = "info";
const KEEP_LOG_DAYS: u64 = 7;

/// Set up console and daily file logging.
///
/// `filter` wins over `RUST_LOG`; without either everything at info and
/// above is logged. Keep the guard alive until exit so buffered lines are
/// flushed.
pub fn init_logging(filter: Option<&str>) -> WorkerGuard {
    let log_dir = get_log_directory();

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = resolve_filter(filter);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());
    tracing::info!("XCord version: {}", env!("CARGO_PKG_VERSION"));

    cleanup_old_logs(&log_dir, KEEP_LOG_DAYS);

    guard
}

fn resolve_filter(filter: Option<&str>) -> EnvFilter {
    if let Some(directives) = filter {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("Warning: Invalid log filter {:?}: {}", directives, e),
        }
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn get_log_directory() -> PathBuf {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("xcord")
        .join("logs");

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    log_dir
}

/// Rotated files are `xcord.log.<date>`; the bare name is never removed
fn is_rotated_log(file_name: &str) -> bool {
    file_name.starts_with(LOG_FILE_NAME) && file_name != LOG_FILE_NAME
}

fn cleanup_old_logs(log_dir: &Path, keep_days: u64) {
    let cutoff = SystemTime::now() - Duration::from_secs(keep_days * 24 * 60 * 60);

    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read log directory for cleanup: {}", e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if is_rotated_log(name) => {}
            _ => continue,
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(m) => m,
            Err(_) => continue,
        };

        if modified < cutoff {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to remove old log file {:?}: {}", path, e);
            } else {
                tracing::debug!("Removed old log file: {:?}", path);
            }
        }
    }
}

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{self, LoggingSettings};

const LOG_FILE: &str = "cadenza.log";

/// Send `tracing` output to a log file so it never lands on the TUI.
///
/// Returns the writer guard; dropping it flushes and closes the file. `None`
/// means logging is off (no usable directory, or a subscriber already set).
pub fn init_logging(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let dir = settings
        .directory
        .clone()
        .or_else(config::default_log_dir)?;

    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("cadenza: cannot create log directory {}: {e}", dir.display());
        return None;
    }

    let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins over the configured filter.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init();

    match installed {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

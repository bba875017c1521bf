//! Tracing setup. The embedded core appends to `{data_dir}/eating-meeting.log`,
//! the diagnostic CLI writes to stderr.

use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::storage::path_utils;

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize tracing to the app log file (append mode).
///
/// Falls back to stderr when the log file cannot be opened. Calling this
/// twice is harmless: the second subscriber is simply not installed.
pub fn init_file_tracing() {
    let data_dir = path_utils::data_dir();
    std::fs::create_dir_all(&data_dir).ok();
    let log_path = path_utils::log_path();

    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open {}: {}, logging to stderr", log_path.display(), e);
            init_stderr_tracing(false);
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_writer(Mutex::new(log_file))
        .with_target(true)
        .with_ansi(false)
        .try_init()
        .ok();
}

/// Initialize tracing to stderr. `verbose` lowers the default level to debug.
pub fn init_stderr_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(if verbose { "debug" } else { "warn" }))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

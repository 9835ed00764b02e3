//! Diagnostic logging to a file.
//!
//! The terminal belongs to the TUI, so traces are written to a log file
//! only. The filter comes from `TUTOR_LOG` and defaults to `warn`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::config::default_data_dir;

pub const LOG_ENV_VAR: &str = "TUTOR_LOG";
const DEFAULT_FILTER: &str = "warn";
const LOG_FILE_NAME: &str = "english-tutor.log";

pub fn default_log_path() -> PathBuf {
    default_data_dir().join(LOG_FILE_NAME)
}

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber writing to `path` (or the default log
/// file). Calling this twice is harmless; the second call is ignored.
pub fn init_logging(path: Option<&Path>) -> io::Result<PathBuf> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();
    Ok(path)
}

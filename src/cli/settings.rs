use std::error::Error;
use std::path::{Path, PathBuf};

use crate::core::config::Config;

pub fn require_path(path: Option<PathBuf>) -> Result<PathBuf, Box<dyn Error>> {
    path.ok_or_else(|| "Could not determine the configuration directory".into())
}

/// `english-tutor set <key> <value>`; other settings in the file are kept.
pub fn set_value(path: &Path, key: &str, value: &str) -> Result<String, Box<dyn Error>> {
    if value.trim().is_empty() {
        return Err(format!("Missing value for '{key}'").into());
    }
    apply(path, key, Some(value))
}

pub fn unset_value(path: &Path, key: &str) -> Result<String, Box<dyn Error>> {
    apply(path, key, None)
}

fn apply(path: &Path, key: &str, value: Option<&str>) -> Result<String, Box<dyn Error>> {
    // Validate before touching the file so a bad key never rewrites it.
    let mut candidate = Config::load_from_path(path)?;
    let message = candidate.apply_setting(key, value)?;
    Config::update(path, |config| {
        let _ = config.apply_setting(key, value);
    })?;
    Ok(message)
}

pub mod data;
pub mod io;
pub mod printing;


pub use data::Config;
pub use io::{default_data_dir, ConfigError};

/// Keys accepted by `english-tutor set/unset`.
pub const SETTABLE_KEYS: &[&str] = &[
    "provider",
    "api-key",
    "model",
    "summary-model",
    "base-url",
    "export-dir",
];

impl Config {
    /// Set (`Some`) or clear (`None`) one setting by its CLI key.
    pub fn apply_setting(&mut self, key: &str, value: Option<&str>) -> Result<String, String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match key {
            "provider" => {
                self.provider = value.map(str::parse).transpose()?;
            }
            "api-key" => self.api_key = value.map(str::to_string),
            "model" => self.model = value.map(str::to_string),
            "summary-model" => self.summary_model = value.map(str::to_string),
            "base-url" => self.base_url = value.map(str::to_string),
            "export-dir" => self.export_dir = value.map(std::path::PathBuf::from),
            other => {
                return Err(format!(
                    "Unknown key '{other}'. Valid keys: {}",
                    SETTABLE_KEYS.join(", ")
                ))
            }
        }
        Ok(match value {
            Some(_) if key == "api-key" => "api-key set".to_string(),
            Some(v) => format!("{key} set to {v}"),
            None => format!("{key} unset"),
        })
    }
}

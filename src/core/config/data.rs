use crate::core::providers::ProviderKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Backend to talk to ("openai" or "gemini")
    pub provider: Option<ProviderKind>,
    pub api_key: Option<String>,
    /// Chat model; falls back to the provider default when unset
    pub model: Option<String>,
    /// Model used for summaries and titles; falls back to `model`
    pub summary_model: Option<String>,
    /// Override for the provider API base URL
    pub base_url: Option<String>,
    /// Directory that `/export` writes into (defaults to the working directory)
    pub export_dir: Option<PathBuf>,
}

impl Config {
    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.unwrap_or_default()
    }

    /// API key from the config file, or from the provider's environment
    /// variable when the file has none.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var(self.provider_kind().api_key_env_var())
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }

    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider_kind().default_model().to_string())
    }

    pub fn resolved_summary_model(&self) -> String {
        self.summary_model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.resolved_model())
    }

    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.provider_kind().default_base_url().to_string())
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("provider: {}", self.provider_kind()),
            format!("model: {}", self.resolved_model()),
        ];
        match &self.summary_model {
            Some(model) => lines.push(format!("summary-model: {model}")),
            None => lines.push("summary-model: (same as model)".to_string()),
        }
        lines.push(format!("base-url: {}", self.resolved_base_url()));
        let key_state = if self.api_key.is_some() {
            "set"
        } else if self.resolved_api_key().is_some() {
            "from environment"
        } else {
            "missing"
        };
        lines.push(format!("api-key: {key_state}"));
        if let Some(dir) = &self.export_dir {
            lines.push(format!("export-dir: {}", path_display(dir)));
        }
        lines
    }
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

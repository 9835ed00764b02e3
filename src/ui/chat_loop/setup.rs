use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::commands::process_input;
use crate::core::app::{App, AppInit};
use crate::core::config::{default_data_dir, Config};
use crate::core::providers::{build_provider, ProviderKind, TutorProvider};
use crate::core::store::Store;

const DB_FILE_NAME: &str = "tutor.db";

/// Startup choices gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub db: Option<PathBuf>,
    pub resume: Option<String>,
    /// Config file to read and write; `None` uses the per-user default.
    pub config_path: Option<PathBuf>,
}

pub fn default_db_path() -> PathBuf {
    default_data_dir().join(DB_FILE_NAME)
}

/// Build the application state and the provider for the chat loop.
///
/// A missing API key is not fatal: the app starts with a banner and chat
/// submission stays blocked until the key is configured.
pub fn bootstrap_app(
    options: ChatOptions,
) -> Result<(App, Option<Arc<dyn TutorProvider>>), Box<dyn Error>> {
    let config_path = options.config_path.or_else(Config::default_path);
    let mut config = match &config_path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::default(),
    };
    if let Some(provider) = options.provider {
        config.provider = Some(provider);
    }

    let db_path = options.db.unwrap_or_else(default_db_path);
    let store = Store::open(&db_path)?;
    info!(db = %db_path.display(), provider = %config.provider_kind(), "starting tutor");

    let provider = build_provider(&config);
    let mut app = App::new(AppInit {
        config,
        config_path,
        store,
        model_override: options.model,
    });

    if let Some(prefix) = options.resume.filter(|p| !p.trim().is_empty()) {
        let result = process_input(&mut app, &format!("/resume {}", prefix.trim()));
        if result.apply(&mut app).is_some() {
            app.ui.set_error("Could not resume the requested session");
        }
    }

    Ok((app, provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_creates_the_database_and_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let options = ChatOptions {
            provider: Some(ProviderKind::Gemini),
            model: Some("gemini-test".into()),
            db: Some(dir.path().join("data").join("tutor.db")),
            resume: None,
            config_path: Some(dir.path().join("config.toml")),
        };
        let (app, _provider) = bootstrap_app(options).unwrap();
        assert!(dir.path().join("data").join("tutor.db").exists());
        assert_eq!(app.provider_kind, ProviderKind::Gemini);
        assert_eq!(app.session.model, "gemini-test");
    }

    #[test]
    fn unknown_resume_prefix_starts_fresh_with_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = ChatOptions {
            db: Some(dir.path().join("tutor.db")),
            resume: Some("deadbeef".into()),
            config_path: Some(dir.path().join("config.toml")),
            ..Default::default()
        };
        let (app, _provider) = bootstrap_app(options).unwrap();
        assert!(app.session.history.is_empty());
        assert_eq!(app.ui.status, crate::core::app::Status::Error);
    }
}

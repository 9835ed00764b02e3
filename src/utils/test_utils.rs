#[cfg(test)]
use crate::core::app::{App, AppInit};
#[cfg(test)]
use crate::core::config::Config;
#[cfg(test)]
use crate::core::message::ChatMessage;
#[cfg(test)]
use crate::core::store::Store;
#[cfg(test)]
use std::path::PathBuf;

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        api_key: Some("test-key".to_string()),
        model: Some("test-model".to_string()),
        ..Default::default()
    }
}

/// App over an in-memory store whose config changes stay in memory.
#[cfg(test)]
pub fn create_test_app() -> App {
    create_test_app_with_config(test_config(), None)
}

#[cfg(test)]
pub fn create_test_app_with_config(config: Config, config_path: Option<PathBuf>) -> App {
    App::new(AppInit {
        config,
        config_path,
        store: Store::open_in_memory().expect("in-memory store"),
        model_override: None,
    })
}

/// Record a completed exchange in memory and in the store.
#[cfg(test)]
pub fn push_exchange(app: &mut App, user: &str, assistant: &str) {
    for message in [ChatMessage::user(user), ChatMessage::assistant(assistant)] {
        app.persist_message(&message);
        app.session.add_message(message);
    }
}

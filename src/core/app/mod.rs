//! The single source of truth for a running tutor session.
//!
//! [`App`] owns the conversation, the view state, the palette, the stream in
//! flight and the open practice quiz. It is owned by the event loop and only
//! changed through the action and command handlers, so tests can build an
//! isolated instance with [`crate::utils::test_utils::create_test_app`].

use std::path::PathBuf;

use tracing::warn;

use crate::core::config::Config;
use crate::core::message::ChatMessage;
use crate::core::providers::ProviderKind;
use crate::core::store::{SessionRecord, SessionUpdate, Store, StoreError};
use crate::core::vocab_practice::{PendingReview, VocabPracticeState};

pub mod actions;
pub mod palette;
pub mod session;
pub mod streaming;
pub mod ui_state;

pub use actions::{
    apply_action, apply_actions, AppAction, AppActionDispatcher, AppCommand, ModelsTarget,
    StreamRequest, TextRequest,
};
pub use palette::{
    palette_items, CommandPaletteState, PaletteAction, PaletteItem, PaletteSource, PaletteView,
};
pub use session::SessionState;
pub use streaming::StreamingState;
pub use ui_state::{Status, UiState, ViewMode};

pub struct App {
    pub session: SessionState,
    pub ui: UiState,
    pub palette: CommandPaletteState,
    pub streaming: StreamingState,
    pub practice: Option<VocabPracticeState>,
    pub config: Config,
    /// Where `/config` writes changes; `None` keeps them in memory.
    pub config_path: Option<PathBuf>,
    pub store: Store,
    pub provider_kind: ProviderKind,
}

/// Everything needed to start the UI.
pub struct AppInit {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub store: Store,
    pub model_override: Option<String>,
}

impl App {
    pub fn new(init: AppInit) -> Self {
        let AppInit {
            config,
            config_path,
            store,
            model_override,
        } = init;
        let model = model_override
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| config.resolved_model());
        let summary_model = config
            .summary_model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| model.clone());

        let mut ui = UiState::new();
        if config.resolved_api_key().is_none() {
            ui.config_error = Some(format!(
                "No API key for {}. Run `english-tutor set api-key <key>` or set {}.",
                config.provider_kind().display_name(),
                config.provider_kind().api_key_env_var()
            ));
        }

        Self {
            session: SessionState::new(model, summary_model),
            ui,
            palette: CommandPaletteState::default(),
            streaming: StreamingState::default(),
            practice: None,
            provider_kind: config.provider_kind(),
            config,
            config_path,
            store,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.ui.config_error.is_none()
    }

    /// Why a chat message cannot be sent right now, if it cannot.
    pub fn chat_blocked_reason(&self) -> Option<String> {
        self.ui.config_error.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.streaming.is_streaming || self.ui.is_thinking()
    }

    pub fn add_notice(&mut self, text: impl Into<String>) {
        self.session.add_message(ChatMessage::notice(text));
        self.ui.on_transcript_grew();
    }

    /// Start over in memory. Persisted rows are untouched.
    pub fn reset_session(&mut self, new_session: bool) {
        self.session.reset(new_session);
        self.ui.scroll_offset = 0;
        self.ui.auto_scroll = true;
    }

    pub fn resume_session(&mut self, record: &SessionRecord) -> Result<(), StoreError> {
        let messages = self.store.load_messages(record.id)?;
        self.session.load(record, messages);
        self.ui.scroll_offset = 0;
        self.ui.auto_scroll = true;
        Ok(())
    }

    /// Merge session fields into the store, reporting failures on the
    /// status line instead of interrupting the learner.
    pub fn persist_session(&mut self, update: SessionUpdate) {
        if let Err(err) = self.store.upsert_session(self.session.session_id, &update) {
            warn!(error = %err, "failed to persist session");
            self.ui.set_error(format!("Could not save session: {err}"));
        }
    }

    pub fn persist_message(&mut self, message: &ChatMessage) {
        if let Err(err) = self.store.append_message(
            self.session.session_id,
            message.id,
            message.role,
            &message.content,
        ) {
            warn!(error = %err, "failed to persist message");
            self.ui.set_error(format!("Could not save message: {err}"));
        }
    }

    pub fn persist_review(&mut self, review: PendingReview) {
        if let Err(err) = self.store.update_vocab_mastery(review.item_id, review.delta) {
            warn!(error = %err, item = review.item_id, "failed to record review");
            self.ui.set_error(format!("Could not record review: {err}"));
        }
    }

    /// Apply a config change through the file so untouched fields survive.
    /// The provider chosen at startup stays in force for the session.
    pub fn update_config<F>(&mut self, mutate: F) -> Result<(), String>
    where
        F: Fn(&mut Config),
    {
        match &self.config_path {
            Some(path) => {
                let mut updated = Config::update(path, &mutate).map_err(|e| e.to_string())?;
                updated.provider = Some(self.provider_kind);
                self.config = updated;
            }
            None => mutate(&mut self.config),
        }
        Ok(())
    }

    pub fn select_model(&mut self, model: String) {
        let chosen = model.clone();
        match self.update_config(move |cfg| cfg.model = Some(chosen.clone())) {
            Ok(()) => self.ui.set_status(format!("Model set to {model}")),
            Err(err) => self
                .ui
                .set_error(format!("Model set to {model} for this session only: {err}")),
        }
        if self.config.summary_model.is_none() {
            self.session.summary_model = model.clone();
        }
        self.session.model = model;
    }
}

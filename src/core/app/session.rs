use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::difficulty::Difficulty;
use crate::core::message::{ApiMessage, ChatMessage, MessageKind};
use crate::core::store::{SessionRecord, StoredMessage};
use crate::core::tutor::{build_request_history, PracticeMode};

/// The conversation being held with the learner right now.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: Uuid,
    pub history: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub summary: Option<String>,
    pub title: Option<String>,
    pub difficulty: Difficulty,
    pub mode: PracticeMode,
    pub model: String,
    pub summary_model: String,
    /// Set once a title request has been issued for this session.
    pub title_requested: bool,
}

impl SessionState {
    pub fn new(model: String, summary_model: String) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
            summary: None,
            title: None,
            difficulty: Difficulty::default(),
            mode: PracticeMode::default(),
            model,
            summary_model,
            title_requested: false,
        }
    }

    /// Append a message, giving it an id if it has none.
    pub fn add_message(&mut self, mut message: ChatMessage) -> Uuid {
        if message.id.is_nil() {
            message.id = Uuid::new_v4();
        }
        let id = message.id;
        self.history.push(message);
        self.updated_at = Utc::now();
        id
    }

    /// Replace the history with `transform(current)`. Messages without an
    /// id receive one.
    pub fn set_history<F>(&mut self, transform: F)
    where
        F: FnOnce(&[ChatMessage]) -> Vec<ChatMessage>,
    {
        let mut next = transform(&self.history);
        for message in &mut next {
            if message.id.is_nil() {
                message.id = Uuid::new_v4();
            }
        }
        self.history = next;
        self.updated_at = Utc::now();
    }

    /// Clear the in-memory conversation. Persisted rows are left alone.
    pub fn reset(&mut self, new_session: bool) {
        self.history.clear();
        self.updated_at = Utc::now();
        if new_session {
            self.session_id = Uuid::new_v4();
            self.created_at = self.updated_at;
            self.summary = None;
            self.title = None;
            self.title_requested = false;
        }
    }

    /// Take over a persisted session and its messages.
    pub fn load(&mut self, record: &SessionRecord, messages: Vec<StoredMessage>) {
        self.session_id = record.id;
        self.created_at = record.created_at;
        self.summary = record.summary.clone();
        self.title = record.title.clone();
        self.title_requested = record.title.is_some();
        self.difficulty = record.difficulty;
        self.mode = record.mode;
        self.set_history(|_| {
            messages
                .into_iter()
                .map(|stored| ChatMessage {
                    id: stored.id,
                    role: stored.role,
                    content: stored.content,
                    kind: MessageKind::Turn,
                })
                .collect()
        });
        self.updated_at = record.updated_at;
    }

    pub fn request_history(&self) -> Vec<ApiMessage> {
        build_request_history(
            &self.history,
            self.difficulty,
            self.mode,
            self.summary.as_deref(),
        )
    }

    pub fn turn_count(&self) -> usize {
        self.history.iter().filter(|m| m.is_turn()).count()
    }

    pub fn has_assistant_turn(&self) -> bool {
        self.history
            .iter()
            .any(|m| m.is_turn() && m.role.is_assistant())
    }
}

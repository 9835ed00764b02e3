mod background;
mod input;
mod streaming;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::App;
use crate::core::message::ApiMessage;

pub enum AppAction {
    AppendResponseChunk {
        content: String,
        stream_id: Uuid,
    },
    StreamCompleted {
        content: String,
        stream_id: Uuid,
    },
    StreamErrored {
        message: String,
        stream_id: Uuid,
    },
    CancelStreaming,
    SubmitMessage {
        message: String,
    },
    ProcessCommand {
        input: String,
    },
    SetStatus {
        message: String,
        is_error: bool,
    },
    ClearStatus,
    SummaryFinished {
        session_id: Uuid,
        result: Result<String, String>,
    },
    TitleFinished {
        session_id: Uuid,
        fallback: Option<String>,
        result: Result<String, String>,
    },
    ModelsLoaded {
        models: Vec<String>,
        target: ModelsTarget,
    },
    ModelsLoadFailed {
        error: String,
    },
}

/// Where a fetched model list should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelsTarget {
    Picker,
    Palette,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub stream_id: Uuid,
    pub model: String,
    pub history: Vec<ApiMessage>,
}

/// One-shot provider call on behalf of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub session_id: Uuid,
    pub model: String,
    pub history: Vec<ApiMessage>,
}

/// Work the event loop performs outside the state store.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    SpawnStream(StreamRequest),
    GenerateSummary(TextRequest),
    GenerateTitle {
        request: TextRequest,
        fallback: Option<String>,
    },
    LoadModels(ModelsTarget),
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppAction>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppAction>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction) {
        let _ = self.tx.send(action);
    }

    pub fn dispatch_many<I>(&self, actions: I)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions {
            self.dispatch(action);
        }
    }
}

pub fn apply_actions(app: &mut App, actions: impl IntoIterator<Item = AppAction>) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for action in actions {
        commands.extend(apply_action(app, action));
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { .. }
        | AppAction::StreamCompleted { .. }
        | AppAction::StreamErrored { .. }
        | AppAction::CancelStreaming
        | AppAction::SubmitMessage { .. } => streaming::handle_streaming_action(app, action),

        AppAction::ProcessCommand { .. } | AppAction::SetStatus { .. } | AppAction::ClearStatus => {
            input::handle_input_action(app, action)
        }

        AppAction::SummaryFinished { .. }
        | AppAction::TitleFinished { .. }
        | AppAction::ModelsLoaded { .. }
        | AppAction::ModelsLoadFailed { .. } => background::handle_background_action(app, action),
    }
}

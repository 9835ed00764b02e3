//! Background work requested by the action handlers.
//!
//! Each [`AppCommand`] either starts a provider stream whose events flow
//! back through the stream channel, or spawns a task that reports its
//! result through the [`AppActionDispatcher`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::app::{apply_action, App, AppAction, AppActionDispatcher, AppCommand};
use crate::core::providers::{StreamEnvelope, StreamSink, TutorProvider};

pub mod model_loader;
pub mod text_request;

#[derive(Clone)]
pub struct ExecutorContext {
    pub provider: Option<Arc<dyn TutorProvider>>,
    pub dispatcher: AppActionDispatcher,
    pub stream_tx: mpsc::UnboundedSender<StreamEnvelope>,
}

impl ExecutorContext {
    pub fn new(
        provider: Option<Arc<dyn TutorProvider>>,
        dispatcher: AppActionDispatcher,
        stream_tx: mpsc::UnboundedSender<StreamEnvelope>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            stream_tx,
        }
    }

    pub fn execute_all(&self, app: &mut App, commands: impl IntoIterator<Item = AppCommand>) {
        for command in commands {
            self.execute(app, command);
        }
    }

    pub fn execute(&self, app: &mut App, command: AppCommand) {
        let Some(provider) = self.provider.clone() else {
            warn!("no provider configured; dropping background command");
            self.reject(app, command);
            return;
        };

        match command {
            AppCommand::SpawnStream(request) => {
                debug!(stream_id = %request.stream_id, model = %request.model, "starting stream");
                let sink = StreamSink::new(self.stream_tx.clone(), request.stream_id);
                let controller = provider.stream_message(request.model, request.history, sink);
                app.streaming.attach_controller(controller);
            }
            AppCommand::GenerateSummary(request) => {
                text_request::spawn_summary(provider, self.dispatcher.clone(), request);
            }
            AppCommand::GenerateTitle { request, fallback } => {
                text_request::spawn_title(provider, self.dispatcher.clone(), request, fallback);
            }
            AppCommand::LoadModels(target) => {
                model_loader::spawn_model_loader(provider, self.dispatcher.clone(), target);
            }
        }
    }

    /// Settle a command that cannot run so the app never stays busy.
    fn reject(&self, app: &mut App, command: AppCommand) {
        const NO_PROVIDER: &str = "No provider is configured";
        let followup = match command {
            AppCommand::SpawnStream(request) => AppAction::StreamErrored {
                message: NO_PROVIDER.to_string(),
                stream_id: request.stream_id,
            },
            AppCommand::GenerateSummary(request) => AppAction::SummaryFinished {
                session_id: request.session_id,
                result: Err(NO_PROVIDER.to_string()),
            },
            AppCommand::GenerateTitle { request, fallback } => AppAction::TitleFinished {
                session_id: request.session_id,
                fallback,
                result: Err(NO_PROVIDER.to_string()),
            },
            AppCommand::LoadModels(_) => AppAction::ModelsLoadFailed {
                error: NO_PROVIDER.to_string(),
            },
        };
        if let Some(next) = apply_action(app, followup) {
            warn!(?next, "command produced follow-up work without a provider");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::Status;
    use crate::utils::test_utils::create_test_app;

    fn context() -> (
        ExecutorContext,
        mpsc::UnboundedReceiver<AppAction>,
        mpsc::UnboundedReceiver<StreamEnvelope>,
    ) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (stream_tx, stream_rx) = mpsc::unbounded_channel();
        let ctx = ExecutorContext::new(None, AppActionDispatcher::new(action_tx), stream_tx);
        (ctx, action_rx, stream_rx)
    }

    #[test]
    fn stream_without_provider_settles_as_an_error() {
        let mut app = create_test_app();
        let command = apply_action(
            &mut app,
            AppAction::SubmitMessage {
                message: "hello".into(),
            },
        )
        .unwrap();
        let (ctx, _actions, _streams) = context();
        ctx.execute(&mut app, command);

        assert!(!app.is_busy());
        assert_eq!(app.ui.status, Status::Error);
        assert!(app
            .session
            .history
            .last()
            .unwrap()
            .content
            .contains("No provider is configured"));
    }

    #[test]
    fn model_load_without_provider_clears_loading_flag() {
        let mut app = create_test_app();
        app.ui.models_loading = true;
        let (ctx, _actions, _streams) = context();
        ctx.execute(
            &mut app,
            AppCommand::LoadModels(crate::core::app::ModelsTarget::Picker),
        );
        assert!(!app.ui.models_loading);
        assert_eq!(app.ui.status, Status::Error);
    }
}

//! One-shot provider calls for session summaries and titles.

use std::sync::Arc;

use tracing::debug;

use crate::core::app::{AppAction, AppActionDispatcher, TextRequest};
use crate::core::providers::TutorProvider;

async fn run(provider: &dyn TutorProvider, request: TextRequest) -> Result<String, String> {
    provider
        .send_message(request.model, request.history)
        .await
        .map_err(|err| err.to_string())
}

pub fn spawn_summary(
    provider: Arc<dyn TutorProvider>,
    dispatcher: AppActionDispatcher,
    request: TextRequest,
) {
    tokio::spawn(async move {
        let session_id = request.session_id;
        debug!(%session_id, "generating summary");
        let result = run(provider.as_ref(), request).await;
        dispatcher.dispatch(AppAction::SummaryFinished { session_id, result });
    });
}

pub fn spawn_title(
    provider: Arc<dyn TutorProvider>,
    dispatcher: AppActionDispatcher,
    request: TextRequest,
    fallback: Option<String>,
) {
    tokio::spawn(async move {
        let session_id = request.session_id;
        debug!(%session_id, "generating title");
        let result = run(provider.as_ref(), request).await;
        dispatcher.dispatch(AppAction::TitleFinished {
            session_id,
            fallback,
            result,
        });
    });
}

use std::sync::Arc;

use crate::core::app::{AppAction, AppActionDispatcher, ModelsTarget};
use crate::core::providers::TutorProvider;

pub fn spawn_model_loader(
    provider: Arc<dyn TutorProvider>,
    dispatcher: AppActionDispatcher,
    target: ModelsTarget,
) {
    tokio::spawn(async move {
        let action = match provider.list_models().await {
            Ok(models) => AppAction::ModelsLoaded { models, target },
            Err(error) => AppAction::ModelsLoadFailed {
                error: error.to_string(),
            },
        };
        dispatcher.dispatch(action);
    });
}

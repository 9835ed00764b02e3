use tracing::{debug, warn};

use super::{App, AppAction, AppCommand, ModelsTarget};
use crate::core::app::{PaletteSource, PaletteView, Status, ViewMode};
use crate::core::store::SessionUpdate;
use crate::core::summary::clean_title;

pub(super) fn handle_background_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SummaryFinished { session_id, result } => {
            summary_finished(app, session_id, result);
            None
        }
        AppAction::TitleFinished {
            session_id,
            fallback,
            result,
        } => {
            title_finished(app, session_id, fallback, result);
            None
        }
        AppAction::ModelsLoaded { models, target } => {
            models_loaded(app, models, target);
            None
        }
        AppAction::ModelsLoadFailed { error } => {
            app.ui.models_loading = false;
            warn!(%error, "model listing failed");
            app.ui.set_error(format!("Failed to load models: {error}"));
            None
        }
        _ => None,
    }
}

fn summary_finished(app: &mut App, session_id: uuid::Uuid, result: Result<String, String>) {
    let is_current = session_id == app.session.session_id;
    if app.ui.status == Status::Thinking && !app.streaming.is_streaming {
        app.ui.clear_status();
    }
    match result.map(|s| s.trim().to_string()) {
        Ok(summary) if !summary.is_empty() => {
            let update = SessionUpdate {
                summary: Some(summary.clone()),
                ..Default::default()
            };
            if let Err(err) = app.store.upsert_session(session_id, &update) {
                warn!(error = %err, "failed to store summary");
                app.ui.set_error(format!("Could not save summary: {err}"));
                return;
            }
            if is_current {
                app.session.summary = Some(summary.clone());
            }
            app.add_notice(format!("Session summary:\n{summary}"));
            app.ui.set_status("Summary saved");
        }
        Ok(_) => {
            app.add_notice("Summary generation failed: the provider returned no text.");
            app.ui.set_error("Summary generation failed");
        }
        Err(err) => {
            warn!(error = %err, "summary generation failed");
            app.add_notice(format!("Summary generation failed: {err}"));
            app.ui.set_error("Summary generation failed");
        }
    }
}

/// Store a generated title, or the fallback when generation failed.
fn title_finished(
    app: &mut App,
    session_id: uuid::Uuid,
    fallback: Option<String>,
    result: Result<String, String>,
) {
    let title = match result {
        Ok(raw) => clean_title(&raw).or(fallback),
        Err(err) => {
            debug!(error = %err, "title generation failed; using fallback");
            fallback
        }
    };
    let Some(title) = title else {
        return;
    };
    let update = SessionUpdate {
        title: Some(title.clone()),
        ..Default::default()
    };
    if let Err(err) = app.store.upsert_session(session_id, &update) {
        warn!(error = %err, "failed to store title");
        return;
    }
    if session_id == app.session.session_id && app.session.title.is_none() {
        app.session.title = Some(title);
    }
}

fn models_loaded(app: &mut App, models: Vec<String>, target: ModelsTarget) {
    app.ui.models_loading = false;
    app.ui.models = models;
    if app.ui.status == Status::Thinking && !app.streaming.is_streaming {
        app.ui.clear_status();
    }
    if app.ui.models.is_empty() {
        app.ui.set_error("The provider returned no models");
        return;
    }
    match target {
        ModelsTarget::Picker => {
            let current = app
                .ui
                .models
                .iter()
                .position(|m| *m == app.session.model)
                .unwrap_or(0);
            app.palette.close();
            app.ui.open_view(ViewMode::ModelsPicker, current);
        }
        ModelsTarget::Palette => {
            if app.ui.view == ViewMode::Chat
                && !(app.palette.open && app.palette.view == PaletteView::Models)
            {
                app.palette.open(PaletteView::Models, PaletteSource::Explicit);
            }
        }
    }
}

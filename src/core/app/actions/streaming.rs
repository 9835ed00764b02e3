use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{App, AppAction, AppCommand, StreamRequest, TextRequest};
use crate::core::app::streaming::FinishedStream;
use crate::core::difficulty::update_difficulty;
use crate::core::message::ChatMessage;
use crate::core::providers::provider_error_hint;
use crate::core::store::SessionUpdate;
use crate::core::summary::{fallback_title, title_request};

pub(super) fn handle_streaming_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { content, stream_id } => {
            if !app.streaming.is_current(stream_id) {
                debug!(%stream_id, "dropping chunk for superseded stream");
                return None;
            }
            append_response_chunk(app, &content);
            None
        }
        AppAction::StreamCompleted { content, stream_id } => {
            if !app.streaming.is_current(stream_id) {
                debug!(%stream_id, "dropping completion for superseded stream");
                return None;
            }
            let finished = app.streaming.finish()?;
            finalize_stream(
                app,
                FinishedStream {
                    content,
                    ..finished
                },
            )
        }
        AppAction::StreamErrored { message, stream_id } => {
            if !app.streaming.is_current(stream_id) {
                return None;
            }
            handle_stream_error(app, message);
            None
        }
        AppAction::CancelStreaming => cancel_stream(app),
        AppAction::SubmitMessage { message } => spawn_stream_for_message(app, message),
        _ => None,
    }
}

pub(super) fn spawn_stream_for_message(app: &mut App, message: String) -> Option<AppCommand> {
    if app.is_busy() {
        return None;
    }
    if let Some(reason) = app.chat_blocked_reason() {
        app.ui.set_error(reason);
        return None;
    }

    let user = ChatMessage::user(message.clone());
    app.session.add_message(user.clone());
    app.persist_message(&user);
    app.ui.on_transcript_grew();

    let stream_id = Uuid::new_v4();
    app.streaming.start(stream_id, message);
    app.ui.set_thinking("Thinking...");
    info!(%stream_id, model = %app.session.model, "starting tutor stream");

    Some(AppCommand::SpawnStream(StreamRequest {
        stream_id,
        model: app.session.model.clone(),
        history: app.session.request_history(),
    }))
}

fn append_response_chunk(app: &mut App, chunk: &str) {
    if app.streaming.append(chunk) {
        app.ui.on_transcript_grew();
    }
}

/// Abort the adapter and finalize from what has arrived so far. The
/// adapter's own completion for this stream is dropped by the id guard.
fn cancel_stream(app: &mut App) -> Option<AppCommand> {
    let finished = app.streaming.abort()?;
    info!(stream_id = %finished.message_id, "stream cancelled");
    let command = finalize_stream(app, finished);
    app.ui.set_status("Response cancelled");
    command
}

/// Record the reply, persist it once, and re-estimate the difficulty from
/// the learner's message. May ask for a session title.
fn finalize_stream(app: &mut App, finished: FinishedStream) -> Option<AppCommand> {
    let FinishedStream {
        message_id,
        content,
        user_message,
    } = finished;
    app.ui.clear_status();

    if !content.is_empty() {
        let reply = ChatMessage {
            id: message_id,
            ..ChatMessage::assistant(content)
        };
        app.session.add_message(reply.clone());
        app.persist_message(&reply);
        app.ui.on_transcript_grew();
    }

    let previous = app.session.difficulty;
    if let Some(user_message) = user_message {
        app.session.difficulty = update_difficulty(previous, &user_message);
    }
    app.persist_session(SessionUpdate {
        difficulty: Some(app.session.difficulty),
        mode: Some(app.session.mode),
        ..Default::default()
    });
    if app.session.difficulty != previous {
        info!(from = %previous, to = %app.session.difficulty, "difficulty adjusted");
        app.ui
            .set_status(format!("Difficulty adjusted to {}", app.session.difficulty));
    }

    title_command(app)
}

fn title_command(app: &mut App) -> Option<AppCommand> {
    if app.session.title.is_some()
        || app.session.title_requested
        || !app.session.has_assistant_turn()
    {
        return None;
    }
    app.session.title_requested = true;
    Some(AppCommand::GenerateTitle {
        request: TextRequest {
            session_id: app.session.session_id,
            model: app.session.summary_model.clone(),
            history: title_request(&app.session.history),
        },
        fallback: fallback_title(&app.session.history),
    })
}

fn handle_stream_error(app: &mut App, message: String) {
    app.streaming.finish();
    warn!(error = %message, "tutor stream failed");

    let mut text = format!("Error: {message}");
    if let Some(hint) = provider_error_hint(app.provider_kind, &message) {
        text.push_str("\n\n");
        text.push_str(hint);
    }
    app.session.add_message(ChatMessage::error(text));
    app.ui.on_transcript_grew();
    app.ui.set_error("The tutor could not reply");
}

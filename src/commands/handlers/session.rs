use tracing::info;

use super::{busy_error, store_error, usage};
use crate::commands::registry::{ArgHint, CommandInvocation};
use crate::commands::CommandResult;
use crate::core::app::{App, AppCommand, TextRequest, ViewMode};
use crate::core::store::{SessionRecord, SessionUpdate};
use crate::core::summary::{clean_title, summary_request};

const USAGE_RENAME: &str = "/rename <session-id-prefix> <title>";
const USAGE_SUMMARY: &str = "/summary [--regenerate]";
const SESSION_HINT_LIMIT: usize = 10;

pub(crate) fn handle_history(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    open_session_picker(app)
}

fn open_session_picker(app: &mut App) -> CommandResult {
    let sessions = match app.store.list_sessions() {
        Ok(sessions) => sessions,
        Err(err) => return store_error(err),
    };
    if sessions.is_empty() {
        return CommandResult::ok("No saved sessions yet");
    }
    app.ui.sessions = sessions;
    app.palette.close();
    app.ui.open_view(ViewMode::SessionPicker, 0);
    CommandResult::Handled
}

/// Find the single session whose id starts with `prefix`.
pub(crate) fn resolve_session(app: &App, prefix: &str) -> Result<SessionRecord, CommandResult> {
    let mut matches = app
        .store
        .find_sessions_by_prefix(prefix)
        .map_err(store_error)?;
    match matches.len() {
        0 => Err(CommandResult::error(format!(
            "No session matches '{prefix}'"
        ))),
        1 => Ok(matches.remove(0)),
        n => Err(CommandResult::error(format!(
            "Session prefix '{prefix}' is ambiguous ({n} matches); type more characters"
        ))),
    }
}

pub(crate) fn handle_resume(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if let Some(err) = busy_error(app) {
        return err;
    }
    match invocation.tokens().as_slice() {
        [] => open_session_picker(app),
        [prefix] => match resolve_session(app, prefix) {
            Ok(record) => resume(app, &record),
            Err(err) => err,
        },
        _ => usage("/resume [session-id-prefix]"),
    }
}

pub(crate) fn resume(app: &mut App, record: &SessionRecord) -> CommandResult {
    if let Err(err) = app.resume_session(record) {
        return store_error(err);
    }
    info!(session = %record.id, "resumed session");
    let mut message = format!("Resumed session {}", record.short_id());
    if let Some(title) = &record.title {
        message.push_str(&format!(": {title}"));
    }
    if app.session.turn_count() == 0 && record.summary.is_some() {
        message.push_str(" (continuing from its summary)");
    }
    CommandResult::ok(message)
}

pub(crate) fn handle_rename(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some((prefix, title)) = invocation.args.split_once(char::is_whitespace) else {
        return usage(USAGE_RENAME);
    };
    let Some(title) = clean_title(title) else {
        return usage(USAGE_RENAME);
    };
    let record = match resolve_session(app, prefix) {
        Ok(record) => record,
        Err(err) => return err,
    };
    let update = SessionUpdate {
        title: Some(title.clone()),
        ..Default::default()
    };
    if let Err(err) = app.store.upsert_session(record.id, &update) {
        return store_error(err);
    }
    if record.id == app.session.session_id {
        app.session.title = Some(title.clone());
        app.session.title_requested = true;
    }
    CommandResult::ok(format!("Renamed {} to \"{title}\"", record.short_id()))
}

pub(crate) fn session_hints(app: &App) -> Vec<ArgHint> {
    app.store
        .list_sessions()
        .unwrap_or_default()
        .into_iter()
        .take(SESSION_HINT_LIMIT)
        .map(|record| {
            ArgHint::new(
                record.short_id(),
                format!("{} ({} messages)", record.label(), record.message_count),
            )
        })
        .collect()
}

pub(crate) fn handle_summary(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let regenerate = match invocation.tokens().as_slice() {
        [] => false,
        ["--regenerate"] => true,
        _ => return usage(USAGE_SUMMARY),
    };
    if let Some(err) = busy_error(app) {
        return err;
    }

    if !regenerate {
        if let Some(summary) = app.session.summary.clone() {
            app.add_notice(format!("Session summary:\n{summary}"));
            return CommandResult::ok("Use /summary --regenerate to refresh it");
        }
    }
    if app.session.turn_count() == 0 {
        return CommandResult::error("Nothing to summarize yet");
    }

    app.ui.set_thinking("Summarizing session...");
    CommandResult::Spawn(AppCommand::GenerateSummary(TextRequest {
        session_id: app.session.session_id,
        model: app.session.summary_model.clone(),
        history: summary_request(&app.session.history),
    }))
}

pub(crate) fn summary_hints(_app: &App) -> Vec<ArgHint> {
    vec![ArgHint::new("--regenerate", "replace the stored summary")]
}

use super::{busy_error, store_error, usage};
use crate::commands::registry::{ArgHint, CommandInvocation};
use crate::commands::CommandResult;
use crate::core::app::{App, ViewMode};
use crate::core::difficulty::Difficulty;
use crate::core::store::SessionUpdate;
use crate::core::tutor::PracticeMode;

const USAGE_CLEAR: &str = "/clear [--new-session]";
const USAGE_DIFFICULTY: &str = "/difficulty [beginner|intermediate|advanced]";
const USAGE_MODE: &str = "/mode [general|grammar|vocab|role-play|fluency|exam]";

pub(crate) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.palette.close();
    app.ui.open_view(ViewMode::Help, 0);
    CommandResult::Handled
}

pub(crate) fn handle_clear(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let new_session = match invocation.tokens().as_slice() {
        [] => false,
        ["--new-session"] => true,
        _ => return usage(USAGE_CLEAR),
    };
    if let Some(err) = busy_error(app) {
        return err;
    }
    app.reset_session(new_session);
    if new_session {
        CommandResult::ok(format!(
            "Started a new session ({})",
            crate::core::store::short_id(app.session.session_id)
        ))
    } else {
        CommandResult::ok("Conversation cleared")
    }
}

pub(crate) fn clear_hints(_app: &App) -> Vec<ArgHint> {
    vec![ArgHint::new("--new-session", "also start a new session id")]
}

pub(crate) fn handle_difficulty(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    match invocation.tokens().as_slice() {
        [] => CommandResult::ok(format!("Difficulty: {}", app.session.difficulty)),
        [level] => match level.parse::<Difficulty>() {
            Ok(level) => {
                app.session.difficulty = level;
                app.persist_session(SessionUpdate {
                    difficulty: Some(level),
                    ..Default::default()
                });
                CommandResult::ok(format!("Difficulty set to {level}"))
            }
            Err(err) => CommandResult::error(err),
        },
        _ => usage(USAGE_DIFFICULTY),
    }
}

pub(crate) fn difficulty_hints(app: &App) -> Vec<ArgHint> {
    Difficulty::ALL
        .iter()
        .map(|level| {
            let note = if *level == app.session.difficulty {
                "current"
            } else {
                ""
            };
            ArgHint::new(level.as_str(), note)
        })
        .collect()
}

pub(crate) fn handle_mode(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    match invocation.tokens().as_slice() {
        [] => {
            let current = PracticeMode::ALL
                .iter()
                .position(|m| *m == app.session.mode)
                .unwrap_or(0);
            app.palette.close();
            app.ui.open_view(ViewMode::ModePicker, current);
            CommandResult::Handled
        }
        [name] => match name.parse::<PracticeMode>() {
            Ok(mode) => set_mode(app, mode),
            Err(err) => CommandResult::error(err),
        },
        _ => usage(USAGE_MODE),
    }
}

pub(crate) fn set_mode(app: &mut App, mode: PracticeMode) -> CommandResult {
    app.session.mode = mode;
    app.persist_session(SessionUpdate {
        mode: Some(mode),
        ..Default::default()
    });
    CommandResult::ok(format!("Practice mode: {mode} ({})", mode.description()))
}

pub(crate) fn mode_hints(_app: &App) -> Vec<ArgHint> {
    PracticeMode::ALL
        .iter()
        .map(|mode| ArgHint::new(mode.as_str(), mode.description()))
        .collect()
}

pub(crate) fn handle_stats(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let stats = match app.store.learner_stats(chrono::Utc::now().date_naive()) {
        Ok(stats) => stats,
        Err(err) => return store_error(err),
    };

    let mut lines = vec![
        "Your progress".to_string(),
        format!("  Sessions: {}", stats.sessions),
        format!("  Messages sent: {}", stats.messages_sent),
        format!("  Words saved: {}", stats.words_saved),
        format!("  Words mastered: {}", stats.words_mastered),
        format!(
            "  Current streak: {} day{}",
            stats.streak_days,
            if stats.streak_days == 1 { "" } else { "s" }
        ),
    ];
    if !stats.by_difficulty.is_empty() {
        lines.push("  Sessions by difficulty:".to_string());
        lines.extend(
            stats
                .by_difficulty
                .iter()
                .map(|g| format!("    {}: {}", g.label, g.count)),
        );
    }
    if !stats.by_mode.is_empty() {
        lines.push("  Sessions by mode:".to_string());
        lines.extend(
            stats
                .by_mode
                .iter()
                .map(|g| format!("    {}: {}", g.label, g.count)),
        );
    }
    app.add_notice(lines.join("\n"));
    CommandResult::ok("Statistics updated")
}

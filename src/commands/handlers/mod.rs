pub(super) mod config;
pub(super) mod core;
pub(super) mod io;
pub(super) mod session;
pub(super) mod vocab;

use crate::commands::CommandResult;
use crate::core::app::App;

pub(super) fn usage(usage: &'static str) -> CommandResult {
    CommandResult::error(format!("Usage: {usage}"))
}

/// Error to return when a command would disturb an in-flight reply.
pub(super) fn busy_error(app: &App) -> Option<CommandResult> {
    app.is_busy()
        .then(|| CommandResult::error("Wait for the current reply to finish first."))
}

pub(super) fn store_error(err: impl std::fmt::Display) -> CommandResult {
    CommandResult::error(format!("Storage error: {err}"))
}

//! Slash-command dispatch.
//!
//! Input is tokenized on whitespace; the first token selects a command from
//! the [`registry`] by exact name. Handlers never fail: problems come back
//! as an error [`CommandResult`] for the status line.

mod handlers;
pub mod registry;

pub use registry::{all_commands, find_command, ArgHint, Command, CommandInvocation};

pub(crate) use handlers::core::set_mode;
pub(crate) use handlers::session::resume;
pub(crate) use handlers::vocab::end_practice;

use crate::core::app::{App, AppCommand};

#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// A line for the status bar.
    Status { message: String, is_error: bool },
    /// The handler switched views itself; nothing to report.
    Handled,
    /// The handler queued background work for the event loop.
    Spawn(AppCommand),
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        CommandResult::Status {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        CommandResult::Status {
            message: message.into(),
            is_error: true,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CommandResult::Status { is_error: true, .. })
    }

    /// Put a status result on the status line and hand back spawned work.
    pub fn apply(self, app: &mut App) -> Option<AppCommand> {
        match self {
            CommandResult::Status { message, is_error } => {
                if is_error {
                    app.ui.set_error(message);
                } else {
                    app.ui.set_status(message);
                }
                None
            }
            CommandResult::Handled => None,
            CommandResult::Spawn(command) => Some(command),
        }
    }
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();
    let (token, args) = match trimmed.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (trimmed, ""),
    };

    let Some(command) = token.strip_prefix('/').and_then(find_command) else {
        return CommandResult::error(format!(
            "Unknown command: {token}. Type /help to see available commands."
        ));
    };

    if let Some(reason) = command.disabled_reason.and_then(|f| f(app)) {
        return CommandResult::error(format!("/{} is unavailable: {reason}", command.name));
    }

    (command.handler)(
        app,
        CommandInvocation {
            input: trimmed,
            args,
        },
    )
}

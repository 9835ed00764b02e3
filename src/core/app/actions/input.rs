use tracing::debug;

use super::{App, AppAction, AppCommand};
use crate::commands::process_input;

pub(super) fn handle_input_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::ProcessCommand { input } => run_command(app, &input),
        AppAction::SetStatus { message, is_error } => {
            if is_error {
                app.ui.set_error(message);
            } else {
                app.ui.set_status(message);
            }
            None
        }
        AppAction::ClearStatus => {
            app.ui.clear_status();
            None
        }
        _ => None,
    }
}

fn run_command(app: &mut App, input: &str) -> Option<AppCommand> {
    debug!(%input, "dispatching command");
    process_input(app, input).apply(app)
}

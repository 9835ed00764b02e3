use super::usage;
use crate::commands::registry::{ArgHint, CommandInvocation};
use crate::commands::CommandResult;
use crate::core::app::{App, AppCommand, ModelsTarget, ViewMode};

const USAGE_CONFIG: &str = "/config [summary-model [<model>|--reset]]";

pub(crate) fn handle_config(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    match invocation.tokens().as_slice() {
        [] => {
            let mut lines = vec!["Settings".to_string()];
            lines.extend(app.config.summary_lines().into_iter().map(|l| format!("  {l}")));
            lines.push(format!("  active model: {}", app.session.model));
            app.add_notice(lines.join("\n"));
            CommandResult::ok("Settings shown above")
        }
        ["summary-model"] => {
            let source = if app.config.summary_model.is_some() {
                "configured"
            } else {
                "same as chat model"
            };
            CommandResult::ok(format!(
                "Summary model: {} ({source})",
                app.session.summary_model
            ))
        }
        ["summary-model", "--reset" | "reset"] => {
            let result = app.update_config(|cfg| cfg.summary_model = None);
            app.session.summary_model = app.session.model.clone();
            match result {
                Ok(()) => CommandResult::ok(format!(
                    "Summary model reset; using {}",
                    app.session.summary_model
                )),
                Err(err) => CommandResult::error(format!("Could not save config: {err}")),
            }
        }
        ["summary-model", model] => {
            let model = model.to_string();
            let value = model.clone();
            let result = app.update_config(move |cfg| cfg.summary_model = Some(value.clone()));
            app.session.summary_model = model.clone();
            match result {
                Ok(()) => CommandResult::ok(format!("Summary model set to {model}")),
                Err(err) => CommandResult::error(format!("Could not save config: {err}")),
            }
        }
        _ => usage(USAGE_CONFIG),
    }
}

pub(crate) fn config_hints(app: &App) -> Vec<ArgHint> {
    let mut hints = vec![
        ArgHint::new("summary-model", "show the summary model"),
        ArgHint::new("summary-model --reset", "use the chat model for summaries"),
    ];
    hints.extend(app.ui.models.iter().map(|model| {
        ArgHint::new(format!("summary-model {model}"), "use for summaries")
    }));
    hints
}

/// Open the model picker, fetching the list first when nothing is cached.
pub(crate) fn handle_models(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.palette.close();
    if app.ui.models.is_empty() {
        app.ui.models_loading = true;
        app.ui.set_thinking("Loading models...");
        return CommandResult::Spawn(AppCommand::LoadModels(ModelsTarget::Picker));
    }
    let current = app
        .ui
        .models
        .iter()
        .position(|m| *m == app.session.model)
        .unwrap_or(0);
    app.ui.open_view(ViewMode::ModelsPicker, current);
    CommandResult::Handled
}

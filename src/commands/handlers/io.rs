use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use super::usage;
use crate::commands::registry::{ArgHint, CommandInvocation};
use crate::commands::CommandResult;
use crate::core::app::App;
use crate::core::config::data::path_display;
use crate::core::export::{export_filename, render, ExportFormat};

const USAGE_EXPORT: &str = "/export [md|txt|json]";

pub(crate) fn handle_export(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let format = match invocation.tokens().as_slice() {
        [] => ExportFormat::Markdown,
        [format] => match format.parse::<ExportFormat>() {
            Ok(format) => format,
            Err(err) => return CommandResult::error(err),
        },
        _ => return usage(USAGE_EXPORT),
    };

    let turns = app.session.turn_count();
    if turns == 0 {
        return CommandResult::error("Nothing to export yet");
    }

    let now = Utc::now();
    let contents = match render(&app.session.history, app.session.session_id, format, now) {
        Ok(contents) => contents,
        Err(err) => return CommandResult::error(format!("Export failed: {err}")),
    };

    let dir = app
        .config
        .export_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let path = dir.join(export_filename(app.session.session_id, format, now));
    if let Err(err) = fs::create_dir_all(&dir).and_then(|_| fs::write(&path, contents)) {
        return CommandResult::error(format!(
            "Could not write {}: {err}",
            path_display(&path)
        ));
    }

    info!(path = %path.display(), messages = turns, "exported conversation");
    CommandResult::ok(format!(
        "Exported {turns} message{} to {}",
        if turns == 1 { "" } else { "s" },
        path_display(&path)
    ))
}

pub(crate) fn export_hints(_app: &App) -> Vec<ArgHint> {
    vec![
        ArgHint::new("md", "Markdown (default)"),
        ArgHint::new("txt", "plain text"),
        ArgHint::new("json", "structured JSON"),
    ]
}

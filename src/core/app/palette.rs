//! Command palette overlay: state, navigation and the visible item set.

use crate::commands::registry::{all_commands, find_command};

use super::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteView {
    #[default]
    Commands,
    Models,
}

/// How the palette was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteSource {
    /// Typed `/` into an empty input.
    Slash,
    /// Opened with a shortcut.
    Explicit,
}

/// Overlay state. `selected == None` means nothing is highlighted, which is
/// distinct from the first row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPaletteState {
    pub open: bool,
    pub selected: Option<usize>,
    pub view: PaletteView,
    pub source: Option<PaletteSource>,
}

impl CommandPaletteState {
    pub fn open(&mut self, view: PaletteView, source: PaletteSource) {
        *self = Self {
            open: true,
            selected: None,
            view,
            source: Some(source),
        };
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Down from the last row (or from an empty list) returns to no
    /// highlight; down from no highlight goes to the first row.
    pub fn move_down(&mut self, len: usize) {
        self.selected = match self.selected {
            None if len > 0 => Some(0),
            Some(i) if i + 1 < len => Some(i + 1),
            _ => None,
        };
    }

    pub fn move_up(&mut self, len: usize) {
        self.selected = match self.selected {
            None if len > 0 => Some(len - 1),
            Some(i) if i > 0 && i <= len => Some(i - 1),
            _ => None,
        };
    }

    /// Drop a highlight that no longer points at a row.
    pub fn clamp(&mut self, len: usize) {
        if self.selected.is_some_and(|i| i >= len) {
            self.selected = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteAction {
    /// Replace the input with this text and keep browsing.
    Fill(String),
    /// Dispatch this command line.
    Run(String),
    SelectModel(String),
    /// Placeholder or unavailable row.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteItem {
    pub label: String,
    pub description: String,
    pub action: PaletteAction,
}

impl PaletteItem {
    fn placeholder(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: String::new(),
            action: PaletteAction::None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.action == PaletteAction::None
    }
}

/// Rows the palette shows for the current input. Never empty while open.
pub fn palette_items(app: &App) -> Vec<PaletteItem> {
    let items = match app.palette.view {
        PaletteView::Models => model_items(app),
        PaletteView::Commands => command_items(app),
    };
    if items.is_empty() {
        let label = match app.palette.view {
            PaletteView::Models if app.ui.models_loading => "Loading models...",
            PaletteView::Models => "No models available",
            PaletteView::Commands => "No matching commands",
        };
        return vec![PaletteItem::placeholder(label)];
    }
    items
}

fn model_items(app: &App) -> Vec<PaletteItem> {
    app.ui
        .models
        .iter()
        .map(|model| PaletteItem {
            label: model.clone(),
            description: if *model == app.session.model {
                "current".to_string()
            } else {
                String::new()
            },
            action: PaletteAction::SelectModel(model.clone()),
        })
        .collect()
}

fn command_items(app: &App) -> Vec<PaletteItem> {
    let input = app.ui.input_text();
    let text = input.trim_start();
    let token = text.split_whitespace().next().unwrap_or("");
    let has_args = text.len() > token.len();

    if !has_args {
        let prefix = token.strip_prefix('/').unwrap_or(token);
        return all_commands()
            .iter()
            .filter(|cmd| cmd.palette_visible && cmd.name.starts_with(prefix))
            .map(|cmd| match cmd.disabled_reason.and_then(|f| f(app)) {
                Some(reason) => PaletteItem {
                    label: format!("/{}", cmd.name),
                    description: format!("unavailable: {reason}"),
                    action: PaletteAction::None,
                },
                None => PaletteItem {
                    label: format!("/{}", cmd.name),
                    description: cmd.description.to_string(),
                    action: PaletteAction::Fill(format!("/{} ", cmd.name)),
                },
            })
            .collect();
    }

    let Some(command) = token.strip_prefix('/').and_then(find_command) else {
        return Vec::new();
    };
    let typed = text[token.len()..].trim_start();
    let hints = command.arg_hints.map(|f| f(app)).unwrap_or_default();
    let mut items: Vec<PaletteItem> = hints
        .into_iter()
        .filter(|hint| hint.value.starts_with(typed))
        .map(|hint| PaletteItem {
            label: hint.value.clone(),
            description: hint.description,
            action: PaletteAction::Run(format!("/{} {}", command.name, hint.value)),
        })
        .collect();
    if items.is_empty() {
        items.push(PaletteItem::placeholder(format!("Usage: {}", command.usage)));
    }
    items
}

//! Key routing for the chat view and the command palette.
//!
//! [`route_key`] is the single entry point for key presses. It looks at the
//! current view, the palette and the stream in flight, mutates [`App`]
//! through the action handlers, and returns any background work for the
//! event loop. Non-chat views are handled in [`super::modes`].

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::Input as TAInput;

use super::modes::{handle_help_key, handle_picker_key, handle_practice_key};
use crate::commands::find_command;
use crate::core::app::{
    apply_action, palette_items, App, AppAction, AppCommand, ModelsTarget, PaletteAction,
    PaletteSource, PaletteView, Status, ViewMode,
};
use crate::core::vocab_practice::PracticeKind;

const PAGE_SCROLL_LINES: u16 = 10;

/// What the event loop should do after a key press.
#[derive(Debug, Default, PartialEq)]
pub struct KeyOutcome {
    pub commands: Vec<AppCommand>,
    pub exit: bool,
}

impl KeyOutcome {
    fn with(command: Option<AppCommand>) -> Self {
        Self {
            commands: command.into_iter().collect(),
            exit: false,
        }
    }

    fn exit() -> Self {
        Self {
            commands: Vec::new(),
            exit: true,
        }
    }
}

pub fn route_key(app: &mut App, key: KeyEvent) -> KeyOutcome {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c')) {
        if app.streaming.is_streaming {
            return KeyOutcome::with(apply_action(app, AppAction::CancelStreaming));
        }
        return KeyOutcome::exit();
    }

    match app.ui.view {
        ViewMode::Chat => handle_chat_key(app, key),
        ViewMode::Help => {
            handle_help_key(app, key);
            KeyOutcome::default()
        }
        ViewMode::ModePicker | ViewMode::ModelsPicker | ViewMode::SessionPicker => {
            handle_picker_key(app, key);
            KeyOutcome::default()
        }
        ViewMode::VocabPractice => {
            handle_practice_key(app, key);
            KeyOutcome::default()
        }
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) -> KeyOutcome {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('p') if ctrl => {
            if app.palette.open && app.palette.view == PaletteView::Commands {
                app.palette.close();
            } else {
                app.palette
                    .open(PaletteView::Commands, PaletteSource::Explicit);
            }
            return KeyOutcome::default();
        }
        KeyCode::Char('o') if ctrl => return KeyOutcome::with(open_models_palette(app)),
        KeyCode::PageUp => {
            app.ui.scroll_up(PAGE_SCROLL_LINES);
            return KeyOutcome::default();
        }
        KeyCode::PageDown => {
            app.ui.scroll_down(PAGE_SCROLL_LINES);
            return KeyOutcome::default();
        }
        _ => {}
    }

    if app.palette.open {
        if let Some(outcome) = handle_palette_key(app, key) {
            return outcome;
        }
    }

    match key.code {
        KeyCode::Enter if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) => {
            app.ui.apply_textarea_edit(|ta| ta.insert_newline());
            KeyOutcome::default()
        }
        KeyCode::Enter => KeyOutcome::with(submit_input(app)),
        KeyCode::Esc => {
            if app.ui.status == Status::Error {
                app.ui.clear_status();
            }
            KeyOutcome::default()
        }
        _ => {
            app.ui.apply_textarea_edit(|ta| {
                ta.input(TAInput::from(key));
            });
            after_input_edit(app);
            KeyOutcome::default()
        }
    }
}

/// Palette navigation. `None` lets the key fall through to the input.
fn handle_palette_key(app: &mut App, key: KeyEvent) -> Option<KeyOutcome> {
    match key.code {
        KeyCode::Up => {
            let len = palette_items(app).len();
            app.palette.move_up(len);
            Some(KeyOutcome::default())
        }
        KeyCode::Down => {
            let len = palette_items(app).len();
            app.palette.move_down(len);
            Some(KeyOutcome::default())
        }
        KeyCode::Esc => {
            if app.palette.source == Some(PaletteSource::Slash) {
                app.ui.slash_dismissed = true;
            }
            app.palette.close();
            Some(KeyOutcome::default())
        }
        KeyCode::Enter if key.modifiers.is_empty() => {
            let Some(index) = app.palette.selected else {
                // A commands palette only stays open over a typed or filled
                // command, which Enter still submits.
                return (app.palette.view != PaletteView::Commands).then(KeyOutcome::default);
            };
            let Some(item) = palette_items(app).into_iter().nth(index) else {
                return Some(KeyOutcome::default());
            };
            Some(KeyOutcome::with(activate_palette_action(app, item.action)))
        }
        _ => None,
    }
}

fn activate_palette_action(app: &mut App, action: PaletteAction) -> Option<AppCommand> {
    match action {
        PaletteAction::Fill(text) => {
            app.ui.set_input_text(&text);
            app.palette.selected = None;
            None
        }
        PaletteAction::Run(line) => {
            app.palette.close();
            app.ui.clear_input();
            apply_action(app, AppAction::ProcessCommand { input: line })
        }
        PaletteAction::SelectModel(model) => {
            app.palette.close();
            app.select_model(model);
            None
        }
        PaletteAction::None => None,
    }
}

fn open_models_palette(app: &mut App) -> Option<AppCommand> {
    if app.palette.open && app.palette.view == PaletteView::Models {
        app.palette.close();
        return None;
    }
    if !app.has_api_key() {
        app.ui.set_error("Models are unavailable: no API key configured");
        return None;
    }
    app.palette.open(PaletteView::Models, PaletteSource::Explicit);
    if !app.ui.models.is_empty() || app.ui.models_loading {
        return None;
    }
    app.ui.models_loading = true;
    app.ui.set_thinking("Loading models...");
    Some(AppCommand::LoadModels(ModelsTarget::Palette))
}

/// Enter in the main input.
fn submit_input(app: &mut App) -> Option<AppCommand> {
    let text = app.ui.input_text();
    if text.trim().is_empty() {
        return None;
    }

    if let Some(literal) = text.strip_prefix("//") {
        return send_chat(app, format!("/{literal}"));
    }

    if text.starts_with('/') {
        let trimmed = text.trim();
        let token = trimmed.split_whitespace().next().unwrap_or("");
        let has_args = trimmed.len() > token.len();
        let exact = token.strip_prefix('/').and_then(find_command).is_some();
        if app.palette.open
            && app.palette.source == Some(PaletteSource::Slash)
            && !has_args
            && !exact
        {
            return None;
        }
        app.palette.close();
        app.ui.clear_input();
        return apply_action(app, AppAction::ProcessCommand { input: text });
    }

    send_chat(app, text)
}

/// The input is kept when the message cannot be sent.
fn send_chat(app: &mut App, message: String) -> Option<AppCommand> {
    if app.is_busy() {
        return None;
    }
    if let Some(reason) = app.chat_blocked_reason() {
        app.ui.set_error(reason);
        return None;
    }
    app.palette.close();
    app.ui.clear_input();
    apply_action(app, AppAction::SubmitMessage { message })
}

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

/// Bracketed paste goes to whichever text field has the keyboard.
pub fn route_paste(app: &mut App, text: &str) {
    let text = sanitize_pasted_text(text);
    if text.is_empty() {
        return;
    }
    match app.ui.view {
        ViewMode::Chat => {
            app.ui.apply_textarea_edit(|ta| {
                ta.insert_str(&text);
            });
            after_input_edit(app);
        }
        ViewMode::VocabPractice => {
            if let Some(practice) = app.practice.as_mut() {
                if practice.kind == PracticeKind::TypeAnswer && !practice.is_answered() {
                    text.chars()
                        .filter(|c| *c != '\n')
                        .for_each(|c| practice.push_char(c));
                }
            }
        }
        _ => {}
    }
}

/// Keep the palette in step with what the learner has typed.
fn after_input_edit(app: &mut App) {
    let text = app.ui.input_text();
    let slash_palette = app.palette.open && app.palette.source == Some(PaletteSource::Slash);
    let commands_palette = app.palette.open && app.palette.view == PaletteView::Commands;

    if !text.starts_with('/') {
        app.ui.slash_dismissed = false;
        if slash_palette || (commands_palette && !text.is_empty()) {
            app.palette.close();
        }
    } else if text.starts_with("//") {
        if commands_palette {
            app.palette.close();
        }
    } else if text == "/"
        && !app.palette.open
        && !app.ui.slash_dismissed
        && !matches!(app.ui.status, Status::Error | Status::Thinking)
    {
        app.palette.open(PaletteView::Commands, PaletteSource::Slash);
    }

    if app.palette.open {
        let len = palette_items(app).len();
        app.palette.clamp(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::utils::test_utils::create_test_app;

    fn press(app: &mut App, code: KeyCode) -> KeyOutcome {
        route_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(app: &mut App, c: char) -> KeyOutcome {
        route_key(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_slash_opens_the_palette_once() {
        let mut app = create_test_app();
        type_text(&mut app, "/");
        assert!(app.palette.open);
        assert_eq!(app.palette.source, Some(PaletteSource::Slash));
        assert_eq!(app.palette.selected, None);

        press(&mut app, KeyCode::Esc);
        assert!(!app.palette.open);
        assert!(app.ui.slash_dismissed);

        press(&mut app, KeyCode::Backspace);
        assert!(!app.ui.slash_dismissed);
        type_text(&mut app, "/");
        assert!(app.palette.open);
    }

    #[test]
    fn dismissed_palette_stays_closed_while_slash_remains() {
        let mut app = create_test_app();
        type_text(&mut app, "/");
        press(&mut app, KeyCode::Esc);
        type_text(&mut app, "he");
        assert!(!app.palette.open);
        assert_eq!(app.ui.input_text(), "/he");
    }

    #[test]
    fn palette_does_not_open_over_an_error() {
        let mut app = create_test_app();
        app.ui.set_error("boom");
        type_text(&mut app, "/");
        assert!(!app.palette.open);
    }

    #[test]
    fn enter_on_a_bare_unknown_prefix_is_suppressed() {
        let mut app = create_test_app();
        type_text(&mut app, "/he");
        let outcome = press(&mut app, KeyCode::Enter);
        assert!(outcome.commands.is_empty());
        assert_eq!(app.ui.input_text(), "/he");
        assert_eq!(app.ui.view, ViewMode::Chat);
    }

    #[test]
    fn enter_on_an_exact_command_dispatches_it() {
        let mut app = create_test_app();
        type_text(&mut app, "/help");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.view, ViewMode::Help);
        assert!(!app.palette.open);
        assert_eq!(app.ui.input_text(), "");
    }

    #[test]
    fn palette_selection_fills_then_runs() {
        let mut app = create_test_app();
        type_text(&mut app, "/diff");
        press(&mut app, KeyCode::Down);
        assert_eq!(app.palette.selected, Some(0));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.input_text(), "/difficulty ");
        assert!(app.palette.open);

        press(&mut app, KeyCode::Up);
        let items = palette_items(&app);
        let last = items.last().unwrap().label.clone();
        press(&mut app, KeyCode::Enter);
        assert!(!app.palette.open);
        assert_eq!(app.session.difficulty.as_str(), last);
    }

    #[test]
    fn filled_command_from_explicit_palette_runs_on_enter() {
        let mut app = create_test_app();
        ctrl(&mut app, 'p');
        let index = palette_items(&app)
            .iter()
            .position(|item| item.label.starts_with("/difficulty"))
            .unwrap();
        app.palette.selected = Some(index);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.input_text(), "/difficulty ");
        assert_eq!(app.palette.selected, None);

        type_text(&mut app, "advanced");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.difficulty.as_str(), "advanced");
        assert_eq!(app.ui.input_text(), "");
    }

    #[test]
    fn palette_navigation_returns_to_no_selection() {
        let mut app = create_test_app();
        ctrl(&mut app, 'p');
        assert_eq!(app.palette.source, Some(PaletteSource::Explicit));
        press(&mut app, KeyCode::Up);
        assert!(app.palette.selected.is_some());
        press(&mut app, KeyCode::Down);
        assert_eq!(app.palette.selected, None);

        let outcome = press(&mut app, KeyCode::Enter);
        assert!(outcome.commands.is_empty());
        assert!(app.palette.open);
    }

    #[test]
    fn double_slash_sends_a_literal_message() {
        let mut app = create_test_app();
        type_text(&mut app, "//etc is a path");
        assert!(!app.palette.open);
        let outcome = press(&mut app, KeyCode::Enter);
        assert!(matches!(outcome.commands[..], [AppCommand::SpawnStream(_)]));
        let sent = app.session.history.last().unwrap();
        assert_eq!(sent.role, Role::User);
        assert_eq!(sent.content, "/etc is a path");
    }

    #[test]
    fn blocked_chat_keeps_the_input() {
        let mut app = create_test_app();
        app.ui.config_error = Some("No API key".into());
        type_text(&mut app, "hello");
        let outcome = press(&mut app, KeyCode::Enter);
        assert!(outcome.commands.is_empty());
        assert_eq!(app.ui.input_text(), "hello");
        assert_eq!(app.ui.status, Status::Error);
    }

    #[test]
    fn ctrl_c_cancels_a_stream_before_exiting() {
        let mut app = create_test_app();
        type_text(&mut app, "hello there");
        press(&mut app, KeyCode::Enter);
        assert!(app.streaming.is_streaming);

        let outcome = ctrl(&mut app, 'c');
        assert!(!outcome.exit);
        assert!(!app.streaming.is_streaming);

        assert!(ctrl(&mut app, 'c').exit);
    }

    #[test]
    fn ctrl_o_loads_models_into_the_palette() {
        let mut app = create_test_app();
        let outcome = ctrl(&mut app, 'o');
        assert_eq!(
            outcome.commands,
            vec![AppCommand::LoadModels(ModelsTarget::Palette)]
        );
        assert!(app.palette.open);
        assert_eq!(app.palette.view, PaletteView::Models);

        app.ui.models = vec!["alpha".into(), "beta".into()];
        app.ui.models_loading = false;
        app.ui.clear_status();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert!(!app.palette.open);
        assert_eq!(app.session.model, "beta");
    }

    #[test]
    fn enter_without_a_highlighted_model_sends_nothing() {
        let mut app = create_test_app();
        app.ui.models = vec!["alpha".into(), "beta".into()];
        assert!(ctrl(&mut app, 'o').commands.is_empty());
        type_text(&mut app, "hello");
        assert_eq!(app.palette.selected, None);

        let outcome = press(&mut app, KeyCode::Enter);
        assert!(outcome.commands.is_empty());
        assert!(!app.streaming.is_streaming);
        assert!(app.session.history.is_empty());
        assert!(app.palette.open);
        assert_eq!(app.ui.input_text(), "hello");
    }

    #[test]
    fn page_keys_scroll_the_transcript() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.ui.scroll_offset, PAGE_SCROLL_LINES);
        assert!(!app.ui.auto_scroll);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.ui.scroll_offset, 0);
        assert!(app.ui.auto_scroll);
    }

    #[test]
    fn mode_picker_wraps_and_applies() {
        let mut app = create_test_app();
        type_text(&mut app, "/mode");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.view, ViewMode::ModePicker);

        press(&mut app, KeyCode::Up);
        let last = crate::core::tutor::PracticeMode::ALL.len() - 1;
        assert_eq!(app.ui.picker.selected, last);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.view, ViewMode::Chat);
        assert_eq!(
            app.session.mode,
            crate::core::tutor::PracticeMode::ALL[last]
        );
    }

    #[test]
    fn paste_is_sanitized_into_the_input() {
        let mut app = create_test_app();
        route_paste(&mut app, "one\r\ntwo\tthree\u{7}");
        assert_eq!(app.ui.input_text(), "one\ntwo    three");
    }

    #[test]
    fn empty_picker_does_not_panic() {
        let mut app = create_test_app();
        app.ui.open_view(ViewMode::ModelsPicker, 0);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.picker.selected, 0);
        assert_eq!(app.ui.view, ViewMode::Chat);
    }

    #[test]
    fn flashcard_review_persists_once_on_advance() {
        let mut app = create_test_app();
        type_text(&mut app, "/save apple, pear,");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "/vocab practice");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.view, ViewMode::VocabPractice);
        assert_eq!(app.practice.as_ref().unwrap().kind, PracticeKind::Flashcard);
        let first = app.practice.as_ref().unwrap().items[0].item_id;

        press(&mut app, KeyCode::Char('y'));
        assert!(!app.practice.as_ref().unwrap().is_answered());
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('y'));
        press(&mut app, KeyCode::Char('y'));
        press(&mut app, KeyCode::Enter);

        let reviewed = app
            .store
            .list_vocab(None)
            .unwrap()
            .into_iter()
            .find(|item| item.id == first)
            .unwrap();
        assert_eq!(reviewed.mastery_level, 1);
        assert_eq!(reviewed.times_reviewed, 1);

        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.view, ViewMode::Chat);
        assert!(app.practice.is_none());
        assert!(app
            .ui
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("1 of 2 correct (50%)")));
    }

    #[test]
    fn escape_flushes_an_answered_item() {
        let mut app = create_test_app();
        type_text(&mut app, "/save apple");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "/vocab practice --type");
        press(&mut app, KeyCode::Enter);

        type_text(&mut app, "Apple");
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "e");
        press(&mut app, KeyCode::Enter);
        assert!(app.practice.as_ref().unwrap().is_answered());

        press(&mut app, KeyCode::Esc);
        assert!(app.practice.is_none());
        let item = &app.store.list_vocab(None).unwrap()[0];
        assert_eq!(item.mastery_level, 1);
        assert_eq!(item.times_reviewed, 1);
    }

    #[test]
    fn help_view_closes_on_escape() {
        let mut app = create_test_app();
        app.ui.open_view(ViewMode::Help, 0);
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.ui.view, ViewMode::Help);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.ui.view, ViewMode::Chat);
    }
}

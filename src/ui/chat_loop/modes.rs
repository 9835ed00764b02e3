//! Key handling for the full-screen views: help, pickers and vocabulary
//! practice.

use ratatui::crossterm::event::{KeyCode, KeyEvent};

use crate::commands::{end_practice, resume, set_mode};
use crate::core::app::{App, ViewMode};
use crate::core::tutor::PracticeMode;
use crate::core::vocab_practice::{PracticeKind, OPTION_KEYS};

pub fn handle_help_key(app: &mut App, key: KeyEvent) {
    if matches!(
        key.code,
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')
    ) {
        app.ui.view = ViewMode::Chat;
    }
}

fn picker_len(app: &App) -> usize {
    match app.ui.view {
        ViewMode::ModePicker => PracticeMode::ALL.len(),
        ViewMode::ModelsPicker => app.ui.models.len(),
        ViewMode::SessionPicker => app.ui.sessions.len(),
        _ => 0,
    }
}

pub fn handle_picker_key(app: &mut App, key: KeyEvent) {
    let len = picker_len(app);
    match key.code {
        KeyCode::Up => app.ui.picker.move_up(len),
        KeyCode::Down => app.ui.picker.move_down(len),
        KeyCode::Esc => app.ui.view = ViewMode::Chat,
        KeyCode::Enter => activate_picker_item(app),
        _ => {}
    }
}

fn activate_picker_item(app: &mut App) {
    let selected = app.ui.picker.selected;
    let view = app.ui.view;
    app.ui.view = ViewMode::Chat;
    match view {
        ViewMode::ModePicker => {
            if let Some(mode) = PracticeMode::ALL.get(selected).copied() {
                set_mode(app, mode).apply(app);
            }
        }
        ViewMode::ModelsPicker => {
            if let Some(model) = app.ui.models.get(selected).cloned() {
                app.select_model(model);
            }
        }
        ViewMode::SessionPicker => {
            let Some(record) = app.ui.sessions.get(selected).cloned() else {
                return;
            };
            if app.is_busy() {
                app.ui
                    .set_error("Wait for the current reply to finish first.");
                return;
            }
            resume(app, &record).apply(app);
        }
        _ => {}
    }
}

pub fn handle_practice_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        end_practice(app);
        return;
    }
    let Some(practice) = app.practice.as_mut() else {
        app.ui.view = ViewMode::Chat;
        return;
    };

    if practice.is_answered() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
            let review = practice.advance();
            let finished = practice.is_finished();
            if let Some(review) = review {
                app.persist_review(review);
            }
            if finished {
                end_practice(app);
            }
        }
        return;
    }

    match (practice.kind, key.code) {
        (PracticeKind::Flashcard, KeyCode::Char(' ') | KeyCode::Enter) => practice.reveal(),
        (PracticeKind::Flashcard, KeyCode::Char('y' | 'Y')) => practice.grade_flashcard(true),
        (PracticeKind::Flashcard, KeyCode::Char('n' | 'N')) => practice.grade_flashcard(false),

        (PracticeKind::TypeAnswer, KeyCode::Char(c)) => practice.push_char(c),
        (PracticeKind::TypeAnswer, KeyCode::Backspace) => practice.pop_char(),
        (PracticeKind::TypeAnswer, KeyCode::Enter) => practice.submit_typed(),

        (PracticeKind::MultipleChoice, KeyCode::Char(c)) => {
            let upper = c.to_ascii_uppercase();
            if let Some(index) = OPTION_KEYS.iter().position(|k| *k == upper) {
                practice.select_option(index);
            }
        }
        (PracticeKind::MultipleChoice, KeyCode::Enter) => practice.confirm_selection(),
        _ => {}
    }
}

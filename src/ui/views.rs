//! Full-screen views drawn instead of the chat: help, pickers and the
//! vocabulary quiz.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::commands::all_commands;
use crate::core::app::{App, ViewMode};
use crate::core::tutor::PracticeMode;
use crate::core::vocab_practice::{
    Feedback, PracticeItem, PracticeKind, VocabPracticeState, OPTION_KEYS,
};
use crate::ui::renderer::truncate_to_width;

const KEY_HELP: &[(&str, &str)] = &[
    ("Enter", "send the message or run the command"),
    ("Alt+Enter", "insert a new line"),
    ("//text", "send a message that starts with /"),
    ("Ctrl+P", "open the command palette"),
    ("Ctrl+O", "choose a model"),
    ("PageUp/PageDown", "scroll the conversation"),
    ("Ctrl+C", "stop the reply, or quit when idle"),
];

fn framed(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {title} "))
}

fn footer(f: &mut Frame, area: Rect, text: &str) {
    f.render_widget(
        Paragraph::new(truncate_to_width(text, area.width as usize))
            .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn split_body(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

pub fn draw_help(f: &mut Frame, _app: &App) {
    let (body, foot) = split_body(f.area());
    let heading = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = vec![Line::styled("Commands", heading)];
    for command in all_commands() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<34}", command.usage),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(command.description),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::styled("Keys", heading));
    for (key, action) in KEY_HELP {
        lines.push(Line::from(vec![
            Span::styled(format!("  {key:<34}"), Style::default().fg(Color::Cyan)),
            Span::raw(*action),
        ]));
    }

    f.render_widget(
        Paragraph::new(lines)
            .block(framed("Help"))
            .wrap(Wrap { trim: false }),
        body,
    );
    footer(f, foot, "Esc, Enter or q to return");
}

/// One row of a picker: label, detail, and whether it is the active choice.
struct PickerRow {
    label: String,
    detail: String,
    current: bool,
}

fn picker_rows(app: &App) -> (&'static str, Vec<PickerRow>, &'static str) {
    match app.ui.view {
        ViewMode::ModePicker => (
            "Practice mode",
            PracticeMode::ALL
                .iter()
                .map(|mode| PickerRow {
                    label: mode.as_str().to_string(),
                    detail: mode.description().to_string(),
                    current: *mode == app.session.mode,
                })
                .collect(),
            "No modes",
        ),
        ViewMode::ModelsPicker => (
            "Model",
            app.ui
                .models
                .iter()
                .map(|model| PickerRow {
                    label: model.clone(),
                    detail: String::new(),
                    current: *model == app.session.model,
                })
                .collect(),
            "No models available",
        ),
        _ => (
            "Resume a session",
            app.ui
                .sessions
                .iter()
                .map(|session| PickerRow {
                    label: format!("{}  {}", session.short_id(), session.label()),
                    detail: format!(
                        "{} messages • {} • {}",
                        session.message_count,
                        session.updated_at.format("%Y-%m-%d %H:%M"),
                        session.mode
                    ),
                    current: session.id == app.session.session_id,
                })
                .collect(),
            "No saved sessions",
        ),
    }
}

pub fn draw_picker(f: &mut Frame, app: &App) {
    let (body, foot) = split_body(f.area());
    let (title, rows, empty) = picker_rows(app);
    let block = framed(title);
    let inner = block.inner(body);
    f.render_widget(block, body);

    let width = inner.width as usize;
    let visible = (inner.height as usize).max(1);
    let selected = app.ui.picker.selected;
    let first = selected.saturating_sub(visible - 1);

    let lines: Vec<Line> = if rows.is_empty() {
        vec![Line::styled(empty, Style::default().fg(Color::DarkGray))]
    } else {
        rows.iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .map(|(index, row)| {
                let marker = if row.current { "● " } else { "  " };
                let text = if row.detail.is_empty() {
                    format!("{marker}{}", row.label)
                } else {
                    format!("{marker}{:<36} {}", row.label, row.detail)
                };
                let style = if index == selected {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default()
                };
                Line::styled(truncate_to_width(&text, width), style)
            })
            .collect()
    };
    f.render_widget(Paragraph::new(lines), inner);
    footer(f, foot, "↑/↓ move • Enter choose • Esc back");
}

pub fn draw_practice(f: &mut Frame, app: &App) {
    let (body, foot) = split_body(f.area());
    let Some(practice) = app.practice.as_ref() else {
        footer(f, foot, "No practice in progress. Esc to return");
        return;
    };

    let title = format!(
        "Vocabulary practice • {} • {}",
        practice.kind.label(),
        practice.collection.as_deref().unwrap_or("all words")
    );
    let lines = match practice.current() {
        Some(item) => practice_lines(practice, item),
        None => vec![Line::raw(format!("Finished: {}", practice.score_line()))],
    };
    f.render_widget(
        Paragraph::new(lines)
            .block(framed(&title))
            .wrap(Wrap { trim: false }),
        body,
    );
    footer(f, foot, practice_hint(practice));
}

fn practice_lines<'a>(practice: &'a VocabPracticeState, item: &'a PracticeItem) -> Vec<Line<'a>> {
    let muted = Style::default().fg(Color::DarkGray);
    let strong = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::styled(
            format!(
                "Word {} of {} • score {}/{}",
                practice.current_index + 1,
                practice.items.len(),
                practice.score.correct,
                practice.score.answered()
            ),
            muted,
        ),
        Line::default(),
    ];

    match practice.kind {
        PracticeKind::Flashcard => {
            lines.push(Line::styled(item.word.clone(), strong));
            lines.push(Line::default());
            if practice.show_answer {
                lines.extend(item.back_side().lines().map(|l| Line::raw(l.to_string())));
            } else {
                lines.push(Line::styled("(Space to show the meaning)", muted));
            }
        }
        PracticeKind::TypeAnswer => {
            lines.push(Line::raw(item.clue()));
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Cyan)),
                Span::raw(practice.user_input.as_str()),
            ]));
        }
        PracticeKind::MultipleChoice => {
            lines.push(Line::raw(item.clue()));
            lines.push(Line::default());
            for (index, option) in item.options.iter().enumerate() {
                let key = OPTION_KEYS.get(index).copied().unwrap_or('?');
                let style = if practice.selected_option == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default()
                };
                lines.push(Line::styled(format!("  {key}) {option}"), style));
            }
        }
    }

    if let Some(feedback) = &practice.feedback {
        lines.push(Line::default());
        lines.push(match feedback {
            Feedback::Correct => Line::styled("Correct!", Style::default().fg(Color::Green)),
            Feedback::Incorrect { expected } => Line::styled(
                format!("Not quite. The answer is: {expected}"),
                Style::default().fg(Color::Red),
            ),
        });
    }
    lines
}

fn practice_hint(practice: &VocabPracticeState) -> &'static str {
    if practice.is_answered() {
        return "Enter or Space for the next word • Esc to finish";
    }
    match practice.kind {
        PracticeKind::Flashcard if practice.show_answer => "y I knew it • n I didn't • Esc to finish",
        PracticeKind::Flashcard => "Space to reveal • Esc to finish",
        PracticeKind::TypeAnswer => "Type the word and press Enter • Esc to finish",
        PracticeKind::MultipleChoice => "A-D to choose • Enter to confirm • Esc to finish",
    }
}

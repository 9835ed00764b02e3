use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::app::{palette_items, App, PaletteView, Status, ViewMode};
use crate::core::message::{ChatMessage, MessageKind, Role};
use crate::ui::views::{draw_help, draw_picker, draw_practice};

const MAX_INPUT_LINES: u16 = 6;
const MAX_PALETTE_ROWS: u16 = 8;

pub fn ui(f: &mut Frame, app: &App) {
    match app.ui.view {
        ViewMode::Chat => draw_chat(f, app),
        ViewMode::Help => draw_help(f, app),
        ViewMode::ModePicker | ViewMode::ModelsPicker | ViewMode::SessionPicker => {
            draw_picker(f, app)
        }
        ViewMode::VocabPractice => draw_practice(f, app),
    }
}

fn draw_chat(f: &mut Frame, app: &App) {
    let input_height = input_line_count(app) + 2;
    let banner_height = if app.ui.config_error.is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(input_height),
        ])
        .split(f.area());

    if let Some(error) = &app.ui.config_error {
        let banner = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" configuration "),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(banner, chunks[0]);
    }

    draw_transcript(f, app, chunks[1]);
    draw_status_line(f, app, chunks[2]);
    draw_input(f, app, chunks[3]);

    if app.palette.open {
        draw_palette(f, app, chunks[1]);
    }
}

fn title_line(app: &App) -> String {
    let session = &app.session;
    let title = session.title.as_deref().unwrap_or("New session");
    format!(
        " {title} • {} • {} • {} ",
        session.mode, session.difficulty, session.model
    )
}

fn draw_transcript(f: &mut Frame, app: &App, area: Rect) {
    let lines = transcript_lines(app);
    let inner_width = area.width.max(1);
    let available_height = area.height.saturating_sub(1);
    let total = wrapped_line_count(&lines, inner_width);

    let max_offset = total.saturating_sub(available_height);
    let from_bottom = app.ui.scroll_offset.min(max_offset);
    let scroll = max_offset - from_bottom;

    let paragraph = Paragraph::new(lines)
        .block(Block::default().title(title_line(app)))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

pub(crate) fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if app.session.history.is_empty() && !app.streaming.is_streaming {
        lines.push(Line::styled(
            "Say hello to start practising. Type / for commands.",
            Style::default().fg(Color::DarkGray),
        ));
    }

    for message in &app.session.history {
        push_message_lines(&mut lines, message);
    }

    if app.streaming.is_streaming {
        let mut content = app.streaming.accumulated_content.clone();
        content.push('▌');
        push_labelled(&mut lines, "Tutor", Color::Green, &content, Style::default());
    }
    lines
}

fn push_message_lines(lines: &mut Vec<Line<'static>>, message: &ChatMessage) {
    match (message.kind, message.role) {
        (MessageKind::Notice, _) => {
            let style = Style::default().fg(Color::DarkGray);
            for text in message.content.lines() {
                lines.push(Line::styled(text.to_string(), style));
            }
            lines.push(Line::default());
        }
        (MessageKind::Error, _) => {
            let style = Style::default().fg(Color::Red);
            for text in message.content.lines() {
                lines.push(Line::styled(text.to_string(), style));
            }
            lines.push(Line::default());
        }
        (MessageKind::Turn, Role::User) => {
            push_labelled(lines, "You", Color::Cyan, &message.content, Style::default())
        }
        (MessageKind::Turn, _) => push_labelled(
            lines,
            "Tutor",
            Color::Green,
            &message.content,
            Style::default(),
        ),
    }
}

fn push_labelled(
    lines: &mut Vec<Line<'static>>,
    label: &str,
    color: Color,
    content: &str,
    body: Style,
) {
    let label_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    let mut first = true;
    for text in content.split('\n') {
        if first {
            lines.push(Line::from(vec![
                Span::styled(format!("{label}: "), label_style),
                Span::styled(text.to_string(), body),
            ]));
            first = false;
        } else {
            lines.push(Line::styled(text.to_string(), body));
        }
    }
    lines.push(Line::default());
}

/// Rows the lines occupy once wrapped to `width` columns.
pub(crate) fn wrapped_line_count(lines: &[Line<'_>], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = lines
        .iter()
        .map(|line| {
            let w = line.width();
            if w == 0 {
                1
            } else {
                w.div_ceil(width)
            }
        })
        .sum();
    rows.min(u16::MAX as usize) as u16
}

fn draw_status_line(f: &mut Frame, app: &App, area: Rect) {
    let (style, prefix) = match app.ui.status {
        Status::Thinking => (Style::default().fg(Color::Yellow), "● "),
        Status::Error => (Style::default().fg(Color::Red), "✗ "),
        Status::Idle => (Style::default().fg(Color::DarkGray), ""),
    };
    let message = match (&app.ui.status_message, app.ui.status) {
        (Some(message), _) => message.clone(),
        (None, Status::Thinking) => "Thinking...".to_string(),
        (None, _) if app.streaming.is_streaming => "Replying... Ctrl+C to stop".to_string(),
        (None, _) => String::new(),
    };
    let text = truncate_to_width(&format!("{prefix}{message}"), area.width as usize);
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn input_line_count(app: &App) -> u16 {
    let lines = app.ui.textarea().lines().len().max(1) as u16;
    lines.min(MAX_INPUT_LINES)
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let title = if app.streaming.is_streaming {
        " Ctrl+C to stop the reply "
    } else {
        " Message (Enter to send, Alt+Enter for a new line, / for commands) "
    };
    let border = if app.ui.status == Status::Error {
        Color::Red
    } else {
        Color::Cyan
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(app.ui.textarea(), inner);
}

fn draw_palette(f: &mut Frame, app: &App, transcript: Rect) {
    let items = palette_items(app);
    let rows = (items.len() as u16).clamp(1, MAX_PALETTE_ROWS);
    let height = (rows + 2).min(transcript.height);
    let width = transcript.width.min(72);
    let area = Rect::new(
        transcript.x,
        transcript.y + transcript.height.saturating_sub(height),
        width,
        height,
    );

    let first = app
        .palette
        .selected
        .map(|s| s.saturating_sub(rows.saturating_sub(1) as usize))
        .unwrap_or(0);
    let inner_width = area.width.saturating_sub(2) as usize;
    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .skip(first)
        .take(rows as usize)
        .map(|(index, item)| {
            let selected = app.palette.selected == Some(index);
            let style = if item.is_disabled() {
                Style::default().fg(Color::DarkGray)
            } else if selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            let text = if item.description.is_empty() {
                item.label.clone()
            } else {
                format!("{:<18} {}", item.label, item.description)
            };
            Line::styled(truncate_to_width(&text, inner_width), style)
        })
        .collect();

    let title = match app.palette.view {
        PaletteView::Commands => " commands ",
        PaletteView::Models => " models ",
    };
    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

/// Cut `text` to at most `max` display columns, ending with an ellipsis
/// when something was removed.
pub(crate) fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{create_test_app, push_exchange};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        assert_eq!(truncate_to_width("日本語です", 5), "日本…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn wrapped_count_counts_blank_lines() {
        let lines = vec![Line::raw("abcdef"), Line::default(), Line::raw("ab")];
        assert_eq!(wrapped_line_count(&lines, 4), 4);
    }

    #[test]
    fn transcript_shows_streaming_partial_reply() {
        let mut app = create_test_app();
        push_exchange(&mut app, "hello", "hi there");
        app.streaming
            .start(uuid::Uuid::new_v4(), "how are you".to_string());
        app.streaming.append("I am");
        let text: Vec<String> = transcript_lines(&app)
            .iter()
            .map(|line| line.to_string())
            .collect();
        assert!(text.contains(&"You: hello".to_string()));
        assert!(text.contains(&"Tutor: I am▌".to_string()));
    }

    #[test]
    fn chat_view_renders_banner_and_palette() {
        let mut app = create_test_app();
        app.ui.config_error = Some("No API key for OpenAI".into());
        app.palette.open(
            PaletteView::Commands,
            crate::core::app::PaletteSource::Explicit,
        );
        let screen = render(&app);
        assert!(screen.contains("No API key for OpenAI"));
        assert!(screen.contains("commands"));
        assert!(screen.contains("/help"));
    }
}

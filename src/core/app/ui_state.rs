use tui_textarea::{CursorMove, TextArea};

use crate::core::store::SessionRecord;
use crate::ui::picker::PickerState;

/// Which full-screen view owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Chat,
    Help,
    ModePicker,
    ModelsPicker,
    SessionPicker,
    VocabPractice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Thinking,
    Error,
}

pub struct UiState {
    pub view: ViewMode,
    pub status: Status,
    pub status_message: Option<String>,
    /// Configuration problem shown as a persistent banner.
    pub config_error: Option<String>,
    textarea: TextArea<'static>,
    /// Set when the learner closed an auto-opened palette; cleared once the
    /// leading slash is gone.
    pub slash_dismissed: bool,
    /// Lines scrolled up from the bottom of the transcript.
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub exit_requested: bool,
    pub models: Vec<String>,
    pub models_loading: bool,
    pub sessions: Vec<SessionRecord>,
    pub picker: PickerState,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            view: ViewMode::Chat,
            status: Status::Idle,
            status_message: None,
            config_error: None,
            textarea: TextArea::default(),
            slash_dismissed: false,
            scroll_offset: 0,
            auto_scroll: true,
            exit_requested: false,
            models: Vec::new(),
            models_loading: false,
            sessions: Vec::new(),
            picker: PickerState::default(),
        }
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn set_input_text(&mut self, text: &str) {
        let lines: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        self.textarea = TextArea::from(lines);
        self.textarea.move_cursor(CursorMove::Bottom);
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn clear_input(&mut self) {
        self.set_input_text("");
    }

    pub fn apply_textarea_edit<F>(&mut self, f: F)
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.textarea);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Status::Idle;
        self.status_message = Some(message.into());
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = Status::Error;
        self.status_message = Some(message.into());
    }

    pub fn set_thinking(&mut self, message: impl Into<String>) {
        self.status = Status::Thinking;
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = Status::Idle;
        self.status_message = None;
    }

    pub fn is_thinking(&self) -> bool {
        self.status == Status::Thinking
    }

    pub fn open_view(&mut self, view: ViewMode, selected: usize) {
        self.view = view;
        self.picker = PickerState::new(selected);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
        self.auto_scroll = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        if self.scroll_offset == 0 {
            self.auto_scroll = true;
        }
    }

    /// New transcript content; follow it when already at the bottom.
    pub fn on_transcript_grew(&mut self) {
        if self.auto_scroll {
            self.scroll_offset = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_text_round_trips_multiline() {
        let mut ui = UiState::new();
        ui.set_input_text("first\nsecond");
        assert_eq!(ui.input_text(), "first\nsecond");
        ui.clear_input();
        assert_eq!(ui.input_text(), "");
    }

    #[test]
    fn scrolling_back_to_bottom_restores_follow() {
        let mut ui = UiState::new();
        ui.scroll_up(5);
        assert!(!ui.auto_scroll);
        ui.on_transcript_grew();
        assert_eq!(ui.scroll_offset, 5);
        ui.scroll_down(10);
        assert!(ui.auto_scroll);
        assert_eq!(ui.scroll_offset, 0);
    }
}

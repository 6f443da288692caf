//! Prompt: the inline input line used for subreddit / search queries.

use deck_proto::protocol::PromptKind;
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_SECONDARY};

/// Longest query accepted, in characters.
const MAX_LEN: usize = 50;

#[derive(Debug, PartialEq, Eq)]
pub enum PromptAction {
    Submitted(PromptKind, String),
    Cancelled,
    Editing,
}

pub struct Prompt {
    input: Input,
    kind: Option<PromptKind>,
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            kind: None,
        }
    }

    pub fn open(&mut self, kind: PromptKind) {
        self.input = Input::default();
        self.kind = Some(kind);
    }

    pub fn is_open(&self) -> bool {
        self.kind.is_some()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        let Some(kind) = self.kind else {
            return PromptAction::Cancelled;
        };
        match key.code {
            KeyCode::Esc => {
                self.kind = None;
                PromptAction::Cancelled
            }
            KeyCode::Enter => {
                self.kind = None;
                let text = self.input.value().trim().to_string();
                self.input = Input::default();
                if text.is_empty() {
                    PromptAction::Cancelled
                } else {
                    PromptAction::Submitted(kind, text)
                }
            }
            KeyCode::Char(_) if self.input.value().chars().count() >= MAX_LEN => {
                PromptAction::Editing
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                PromptAction::Editing
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let Some(kind) = self.kind else {
            return;
        };
        let label = kind.label();
        let label_width = label.chars().count() as u16;
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(label_width + 1) as usize);
        let value = self.input.value();
        let visible: String = value.chars().skip(scroll).collect();

        let line = Line::from(vec![
            Span::styled(label, Style::default().fg(C_SECONDARY)),
            Span::styled(visible, Style::default().fg(C_FILTER_FG)),
        ]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(C_FILTER_BG)),
            area,
        );

        let cursor_x = area.x + label_width + (self.input.visual_cursor() - scroll) as u16;
        frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new()
    }
}

//! Frame rendering: help line, result list, prompt line, status line.

use deck_proto::row::RowKind;
use deck_proto::state::DeckState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::keymap::help_line;
use crate::prompt::Prompt;
use crate::theme::{
    style_default, style_help, style_muted, style_selected, style_status, style_title, C_BUSY,
    C_DIRECTORY, C_OK,
};

/// Rows left for the result list in a terminal `height` rows tall.
pub fn list_height(height: u16) -> usize {
    height.saturating_sub(3) as usize
}

pub fn draw(frame: &mut Frame, state: &DeckState, prompt: &Prompt) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_help(frame, chunks[0], state);
    draw_results(frame, chunks[1], state);
    prompt.draw(frame, chunks[2]);
    draw_status(frame, chunks[3], state);
}

fn draw_help(frame: &mut Frame, area: Rect, state: &DeckState) {
    let source = state.active_source();
    let title = if source.title.is_empty() {
        state.active.label().to_string()
    } else {
        source.title.clone()
    };
    let line = Line::from(vec![
        Span::styled(format!("[{}] ", title), style_title()),
        Span::styled(help_line(state.active), style_help()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_results(frame: &mut Frame, area: Rect, state: &DeckState) {
    let source = state.active_source();
    if source.rows.is_empty() {
        let text = if source.loaded { "No results" } else { "" };
        frame.render_widget(Paragraph::new(Span::styled(text, style_muted())), area);
        return;
    }

    let vp = source.viewport;
    let lines: Vec<Line> = source
        .rows
        .iter()
        .skip(vp.scroll)
        .take(area.height as usize)
        .enumerate()
        .map(|(i, row)| {
            let style = if i == vp.cursor {
                style_selected()
            } else {
                match row.kind {
                    RowKind::Directory => Style::default().fg(C_DIRECTORY),
                    RowKind::None => style_muted(),
                    RowKind::Playable | RowKind::Downloadable => style_default(),
                }
            };
            // pad the selection bar across the whole width
            let text = format!("{:<width$}", row.display, width = area.width as usize);
            Line::from(Span::styled(text, style))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DeckState) {
    let mut spans = Vec::new();
    if state.download.is_some() {
        let waiting = state.queue.len();
        let badge = if waiting > 0 {
            format!("⇣{} ", waiting + 1)
        } else {
            "⇣ ".to_string()
        };
        spans.push(Span::styled(badge, Style::default().fg(C_BUSY)));
    } else if !state.queue.is_empty() {
        spans.push(Span::styled(
            format!("⇣{} ", state.queue.len()),
            Style::default().fg(C_OK),
        ));
    }
    spans.push(Span::styled(state.status.clone(), style_status()));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub mod body;
pub mod colors;
pub mod preview;
pub mod tag_bar;

use crate::screen::{Focus, ScreenState};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const MIN_WIDTH: u16 = 30;
const MIN_HEIGHT: u16 = 8;
const PROMPT: &str = "> ";

pub fn draw(frame: &mut Frame, state: &mut ScreenState) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        draw_too_small(frame, area);
        return;
    }

    let (body_constraint, preview_constraint) = if state.views.is_empty() {
        (Constraint::Min(3), Constraint::Length(0))
    } else {
        (Constraint::Length((area.height / 3).max(5)), Constraint::Min(3))
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            body_constraint,
            preview_constraint,
            Constraint::Length(1),
        ])
        .split(area);

    tag_bar::draw(frame, chunks[0], &state.name, &state.tag, state.dirty);

    state.body_area = chunks[1];
    body::draw(
        frame,
        chunks[1],
        &state.body,
        state.highlight,
        &mut state.scroll,
        state.focus == Focus::Body,
    );

    if let Some(view) = state.views.last() {
        preview::draw(
            frame,
            chunks[2],
            view,
            &state.root,
            state.focus == Focus::View,
        );
    }

    draw_input(frame, chunks[3], &state.input);
}

fn draw_input(frame: &mut Frame, area: Rect, input: &str) {
    let line = Line::from(vec![
        Span::styled(PROMPT, Style::default().fg(colors::CYAN)),
        Span::styled(input.to_string(), Style::default().fg(colors::TEXT)),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let column = (PROMPT.len() + input.chars().count()) as u16;
    frame.set_cursor_position((area.x + column.min(area.width.saturating_sub(1)), area.y));
}

fn draw_too_small(frame: &mut Frame, area: Rect) {
    let message = Paragraph::new(Line::from(Span::raw("Terminal too small")))
        .block(Block::default().borders(Borders::NONE))
        .style(Style::default().fg(colors::GRAY));
    frame.render_widget(message, area);
}

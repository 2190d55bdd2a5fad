use crate::ui::colors;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

const HEADINGS: [&str; 3] = ["UNSTAGED", "STAGED", "UNTRACKED"];

pub fn draw(
    frame: &mut Frame,
    area: Rect,
    body: &[String],
    highlight: usize,
    scroll: &mut usize,
    focused: bool,
) {
    let visible_height = area.height.saturating_sub(2) as usize;
    *scroll = keep_visible(*scroll, highlight, visible_height);

    let items: Vec<ListItem> = body
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(index, line)| body_item(line, focused && index == highlight))
        .collect();

    let border = if focused { colors::CYAN } else { colors::OVERLAY };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );

    frame.render_widget(list, area);
}

/// Scroll offset that keeps `highlight` inside a window of `height` rows.
pub fn keep_visible(scroll: usize, highlight: usize, height: usize) -> usize {
    if height == 0 {
        return scroll;
    }
    if highlight < scroll {
        highlight
    } else if highlight >= scroll + height {
        highlight + 1 - height
    } else {
        scroll
    }
}

fn body_item(line: &str, is_highlighted: bool) -> ListItem<'static> {
    let prefix = if is_highlighted { "> " } else { "  " };
    let base_style = if is_highlighted {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    ListItem::new(Line::from(vec![
        Span::styled(prefix, base_style.fg(colors::TEXT)),
        Span::styled(line.to_string(), base_style.patch(line_style(line))),
    ]))
}

fn line_style(line: &str) -> Style {
    let trimmed = line.trim_start();
    if HEADINGS.contains(&trimmed) {
        Style::default()
            .fg(colors::CYAN)
            .add_modifier(Modifier::BOLD)
    } else if trimmed.starts_with("Add ") {
        Style::default().fg(colors::YELLOW)
    } else if trimmed.starts_with("Unstage ") {
        Style::default().fg(colors::GREEN)
    } else {
        Style::default().fg(colors::TEXT)
    }
}

use crate::screen::{FileView, ViewContent};
use crate::ui::colors;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::path::Path;

pub fn draw(frame: &mut Frame, area: Rect, view: &FileView, root: &Path, focused: bool) {
    let inner_height = area.height.saturating_sub(2) as usize;

    let (lines, total_lines) = match &view.content {
        ViewContent::Text(text) => (render_lines(text), text.len()),
        ViewContent::Binary => (placeholder("Binary file", colors::GRAY), 2),
        ViewContent::Unreadable(reason) => (placeholder(reason, colors::RED), 2),
    };

    let scroll_offset = view.scroll.min(total_lines.saturating_sub(inner_height));

    let border = if focused { colors::CYAN } else { colors::OVERLAY };
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(title(view, root)),
        )
        .scroll((scroll_offset as u16, 0));

    frame.render_widget(paragraph, area);
}

fn title(view: &FileView, root: &Path) -> String {
    let name = view.path.strip_prefix(root).unwrap_or(&view.path);
    if view.dirty {
        format!("{}*", name.display())
    } else {
        name.display().to_string()
    }
}

fn placeholder(message: &str, color: ratatui::style::Color) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
    ]
}

fn render_lines(text: &[String]) -> Vec<Line<'static>> {
    let line_num_width = text.len().to_string().len().max(3);
    text.iter()
        .enumerate()
        .map(|(i, line)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>width$} │ ", i + 1, width = line_num_width),
                    Style::default().fg(colors::GRAY),
                ),
                Span::styled(line.replace('\t', "    "), Style::default().fg(colors::TEXT)),
            ])
        })
        .collect()
}

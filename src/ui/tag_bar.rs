use crate::ui::colors;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Window name, dirty marker and the command words.
pub fn draw(frame: &mut Frame, area: Rect, name: &str, tag: &str, dirty: bool) {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(
            name.to_string(),
            Style::default()
                .fg(colors::CYAN)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if dirty {
        spans.push(Span::styled("*", Style::default().fg(colors::YELLOW)));
    }
    spans.push(Span::raw("  "));
    spans.extend(tag.split_whitespace().flat_map(|word| {
        [
            Span::styled(word.to_string(), Style::default().fg(colors::TEXT)),
            Span::raw(" "),
        ]
    }));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(colors::SURFACE));
    frame.render_widget(paragraph, area);
}

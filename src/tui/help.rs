use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

pub const MENU_KEYS: &[(&str, &str)] = &[
    ("↑/↓", "Navigate"),
    ("Enter/Space", "Select"),
    ("q", "Quit"),
];

pub const DETAIL_KEYS: &[(&str, &str)] = &[("↑/↓", "Scroll"), ("any other key", "Back")];

/// One-line key legend shown under a screen.
pub fn legend(bindings: &[(&str, &str)]) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (i, (key, action)) in bindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            key.to_string(),
            Style::default().fg(Color::Magenta),
        ));
        spans.push(Span::styled(
            format!(": {action}"),
            Style::default().fg(Color::Gray),
        ));
    }
    Line::from(spans)
}

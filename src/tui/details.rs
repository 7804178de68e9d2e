use crate::model::{Entry, ProbeResult};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

fn gray(text: String) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
}

/// Per-server breakdown for the "List all servers" screen.
pub fn detail_lines(entries: &[Entry], results: &[ProbeResult]) -> Vec<Line<'static>> {
    if entries.is_empty() {
        return vec![Line::from(Span::styled(
            "  No MCP servers configured",
            Style::default().fg(Color::Yellow),
        ))];
    }

    let mut out = Vec::new();
    for entry in entries {
        let state = if entry.enabled {
            Span::styled("enabled", Style::default().fg(Color::Green))
        } else {
            Span::styled("disabled", Style::default().fg(Color::Red))
        };
        out.push(Line::from(vec![
            Span::styled(
                format!("  {}", entry.name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" - "),
            state,
        ]));
        out.push(gray(format!("    Command: {}", entry.definition.command)));
        out.push(gray(format!("    Args: {}", entry.definition.args.join(" "))));
        if let Some(env) = entry.definition.env.as_ref().filter(|e| !e.is_empty()) {
            // values can be secrets; keys only
            let keys: Vec<&str> = env.keys().map(String::as_str).collect();
            out.push(gray(format!("    Env: {}", keys.join(", "))));
        }

        if let Some(result) = results.iter().find(|r| r.name == entry.name) {
            let mut spans = vec![Span::raw("    Status: ")];
            if result.reachable {
                spans.push(Span::styled("✓ Running", Style::default().fg(Color::Green)));
            } else {
                spans.push(Span::styled(
                    "✗ Not running",
                    Style::default().fg(Color::Red),
                ));
            }
            if let Some(detail) = &result.detail {
                spans.push(Span::styled(
                    format!(" ({detail})"),
                    Style::default().fg(Color::Red),
                ));
            }
            out.push(Line::from(spans));
        }
        out.push(Line::from(""));
    }
    out
}

//! Plain-text and JSON listings for non-interactive output.

use crate::model::{Entry, ProbeResult};
use anyhow::Result;
use serde::Serialize;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build the server listing. Probe results, when given, add a status line per server.
pub(crate) fn build_text_summary(entries: &[Entry], results: Option<&[ProbeResult]>) -> TextSummary {
    let mut lines = vec![String::new(), "  MCP Servers".to_string(), String::new()];

    if entries.is_empty() {
        lines.push("  No MCP servers configured".to_string());
        return TextSummary { lines };
    }

    for entry in entries {
        let state = if entry.enabled {
            "✓ Enabled"
        } else {
            "✗ Disabled"
        };
        lines.push(format!("  {} - {state}", entry.name));
        lines.push(format!("    Command: {}", entry.definition.command_line()));

        let result = results.and_then(|rs| rs.iter().find(|r| r.name == entry.name));
        if let Some(r) = result {
            let status = if r.reachable {
                "✓ Running"
            } else {
                "✗ Not running"
            };
            match &r.detail {
                Some(detail) => lines.push(format!("    Status: {status} ({detail})")),
                None => lines.push(format!("    Status: {status}")),
            }
        }
    }
    lines.push(String::new());
    TextSummary { lines }
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    #[serde(flatten)]
    entry: &'a Entry,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a ProbeResult>,
}

/// Entries (and probe results, when given) as a pretty JSON array.
pub(crate) fn build_json_listing(entries: &[Entry], results: Option<&[ProbeResult]>) -> Result<String> {
    let rows: Vec<JsonEntry<'_>> = entries
        .iter()
        .map(|entry| JsonEntry {
            entry,
            status: results.and_then(|rs| rs.iter().find(|r| r.name == entry.name)),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

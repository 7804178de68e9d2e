//! Menu model for the interactive session.

use crate::model::{Entry, ProbeResult};
use crate::tui::{ItemStatus, MenuItem};

pub(crate) const MENU_TITLE: &str = "MCP Server Manager";

/// What the user picked from the main menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MenuAction {
    ListAll,
    Refresh,
    Toggle(String),
    Quit,
}

/// Fixed actions around one toggle item per server.
///
/// A server's status glyph shows its probe result when there is one, otherwise its partition.
/// An unreachable server only counts as an error while it is enabled.
pub(crate) fn build_menu(entries: &[Entry], results: &[ProbeResult]) -> Vec<MenuItem<MenuAction>> {
    let mut items = Vec::with_capacity(entries.len() + 3);
    items.push(MenuItem::new("List all servers", MenuAction::ListAll));
    items.push(MenuItem::new("Refresh status", MenuAction::Refresh));

    for entry in entries {
        let status = match results.iter().find(|r| r.name == entry.name) {
            Some(r) if r.reachable => ItemStatus::Running,
            Some(_) if entry.enabled => ItemStatus::Error,
            Some(_) => ItemStatus::Stopped,
            None if entry.enabled => ItemStatus::Enabled,
            None => ItemStatus::Disabled,
        };
        let mark = if entry.enabled { "✓" } else { "✗" };
        items.push(
            MenuItem::new(
                format!("{mark} {}", entry.name),
                MenuAction::Toggle(entry.name.clone()),
            )
            .with_status(status),
        );
    }

    items.push(MenuItem::new("Quit", MenuAction::Quit));
    items
}

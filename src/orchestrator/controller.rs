//! Interactive session controller.
//!
//! Runs the probe → menu → dispatch loop until the user quits. Terminal work happens on blocking
//! threads; registry reads and writes happen between selector runs, never during one.

use super::menu::{build_menu, MenuAction, MENU_TITLE};
use crate::model::{Entry, ProbeResult};
use crate::probe::Prober;
use crate::registry::{Registry, RegistryError};
use crate::tui::{self, Tone};
use anyhow::{Context, Result};
use std::future::Future;
use tokio::time::Duration;

const DETAILS_TITLE: &str = "Detailed Server Information";

/// How long a toggle result stays on screen before the menu comes back.
const MESSAGE_PAUSE: Duration = Duration::from_millis(1500);

/// Whether the session keeps going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// A failed action never ends the session; its error becomes a message for the user.
fn settle(result: Result<Flow>) -> (Flow, Option<String>) {
    match result {
        Ok(flow) => (flow, None),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "menu action failed");
            (Flow::Continue, Some(format!("✗ Error: {e:#}")))
        }
    }
}

/// Keep a message on screen for `duration`, or stop early when `interrupt` fires.
async fn linger<F: Future>(duration: Duration, interrupt: F) -> Flow {
    tokio::select! {
        _ = tokio::time::sleep(duration) => Flow::Continue,
        _ = interrupt => {
            tracing::info!("interrupted while showing a message");
            Flow::Stop
        }
    }
}

/// Run a blocking terminal interaction off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("terminal task failed")?
}

/// Drive the interactive session until the user quits or interrupts.
pub(crate) async fn run_session(registry: &Registry, prober: &Prober) -> Result<()> {
    let mut cursor = 0;

    loop {
        let entries = registry.list();
        let results = tokio::select! {
            results = prober.probe_all(&entries) => results,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted while probing servers");
                break;
            }
        };

        let items = build_menu(&entries, &results);
        let outcome = blocking(move || tui::select(MENU_TITLE, items, cursor)).await?;
        cursor = outcome.cursor;

        let action = match outcome.choice {
            None | Some(MenuAction::Quit) => break,
            Some(action) => action,
        };
        tracing::debug!(?action, "menu action chosen");

        let (flow, error) = settle(handle_action(registry, &entries, &results, action).await);
        if let Some(message) = error {
            tui::say(Tone::Error, &message);
            blocking(|| tui::pause("Press any key to continue...")).await?;
        }
        if flow == Flow::Stop {
            break;
        }
    }

    tui::say(Tone::Success, "Goodbye!");
    Ok(())
}

async fn handle_action(
    registry: &Registry,
    entries: &[Entry],
    results: &[ProbeResult],
    action: MenuAction,
) -> Result<Flow> {
    match action {
        MenuAction::ListAll => {
            let lines = tui::detail_lines(entries, results);
            blocking(move || tui::show_details(DETAILS_TITLE, lines)).await?;
            Ok(Flow::Continue)
        }
        MenuAction::Refresh => {
            tui::say(Tone::Warning, "Refreshing server status...");
            Ok(Flow::Continue)
        }
        MenuAction::Toggle(name) => toggle_with_confirmation(registry, name).await,
        MenuAction::Quit => Ok(Flow::Stop),
    }
}

async fn toggle_with_confirmation(registry: &Registry, name: String) -> Result<Flow> {
    // re-read: the menu may be stale if the files changed underneath us
    let entry = registry
        .get(&name)
        .ok_or_else(|| RegistryError::NotFound(name.clone()))?;

    let verb = if entry.enabled { "Disable" } else { "Enable" };
    let prompt = format!("{verb} server '{name}'?");
    let confirmed = blocking(move || tui::confirm(&prompt)).await?;

    if confirmed {
        let enabled = registry.toggle(&name)?;
        let state = if enabled { "enabled" } else { "disabled" };
        tui::say(Tone::Success, &format!("✓ Server '{name}' {state}"));
    } else {
        tui::say(Tone::Info, "Operation cancelled");
    }

    // ctrl_c() owns SIGINT once installed, so every wait outside raw mode listens for it
    Ok(linger(MESSAGE_PAUSE, tokio::signal::ctrl_c()).await)
}

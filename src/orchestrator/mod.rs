//! Interactive session orchestration.
//!
//! This module owns the menu loop: it re-reads the registry, probes every server, builds the
//! menu, hands it to the selector and dispatches the chosen action. The CLI layer calls into
//! it only when an interactive terminal is available.

mod controller;
mod menu;

pub(crate) use controller::run_session;

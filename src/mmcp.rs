//! Export to and import from mmcp's `~/.mmcp.json`.
//!
//! The file is `{"mcpServers": {name: {command, args, env?}}, "agents": [...]}`. Export merges
//! the active servers into `mcpServers` and leaves every other key alone.

use crate::model::LaunchDefinition;
use crate::registry::{Registry, RegistryError};
use crate::storage::atomic_write;
use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const SERVERS_KEY: &str = "mcpServers";

#[derive(Debug, Default, Serialize)]
pub struct ExportReport {
    /// `(name, command)` for every active server that was exported.
    pub exported: Vec<(String, String)>,
    pub added: Vec<String>,
    pub updated: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub imported: Vec<String>,
    /// Already present in the active or disabled table.
    pub skipped: Vec<String>,
    /// Entries that could not be read as a launch definition, with the reason.
    pub invalid: Vec<(String, String)>,
}

/// Read the mmcp document. A missing file is an empty document; anything unparsable is an error
/// so that export never overwrites a file it does not understand.
fn read_document(path: &Path) -> Result<Map<String, Value>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "mmcp file missing, starting empty");
            return Ok(Map::new());
        }
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };
    match serde_json::from_str::<Value>(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("{} is not a JSON object", path.display()),
    }
}

pub fn export_to_mmcp(registry: &Registry, path: &Path) -> Result<ExportReport> {
    let active = registry.store().load_active();
    let mut report = ExportReport::default();
    if active.is_empty() {
        return Ok(report);
    }

    let mut doc = read_document(path)?;
    let servers = doc
        .entry(SERVERS_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| anyhow!("'{SERVERS_KEY}' in {} is not an object", path.display()))?;

    for (name, def) in active.iter() {
        if servers.contains_key(name) {
            report.updated.push(name.to_string());
        } else {
            report.added.push(name.to_string());
        }
        report
            .exported
            .push((name.to_string(), def.command.clone()));
        servers.insert(name.to_string(), serde_json::to_value(def)?);
    }

    let text = serde_json::to_string_pretty(&Value::Object(doc))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    atomic_write(path, format!("{text}\n").as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        added = report.added.len(),
        updated = report.updated.len(),
        "exported servers to mmcp"
    );
    Ok(report)
}

/// Add every mmcp server whose name is not yet known, as enabled.
pub fn import_from_mmcp(registry: &Registry, path: &Path) -> Result<ImportReport> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    let doc = read_document(path)?;
    let servers = match doc.get(SERVERS_KEY) {
        Some(Value::Object(servers)) => servers.clone(),
        Some(_) => bail!("'{SERVERS_KEY}' in {} is not an object", path.display()),
        None => Map::new(),
    };

    let mut report = ImportReport::default();
    for (name, value) in servers {
        let def = match serde_json::from_value::<LaunchDefinition>(value) {
            Ok(def) => def,
            Err(e) => {
                tracing::warn!(server = %name, error = %e, "skipping unreadable mmcp entry");
                report.invalid.push((name, e.to_string()));
                continue;
            }
        };
        match registry.add(&name, def) {
            Ok(()) => report.imported.push(name),
            Err(RegistryError::DuplicateName(_)) => report.skipped.push(name),
            Err(RegistryError::InvalidDefinition(reason)) => report.invalid.push((name, reason)),
            Err(e) => return Err(e).context("import aborted"),
        }
    }
    Ok(report)
}

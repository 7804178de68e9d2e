//! Split-file persistence for the active and disabled server tables.
//!
//! The active table lives inside Codex's own `config.toml`, so every other top-level key in
//! that file is carried through a save untouched. Loads never fail: a missing or unreadable
//! file is an empty table. Saves always report failure, and refuse to replace a `config.toml`
//! they cannot parse.

use crate::model::{AppConfig, LaunchDefinition, ServerMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const ACTIVE_TABLE: &str = "mcp_servers";
const DISABLED_TABLE: &str = "disabled_servers";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to overwrite {}: it is not valid TOML", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize {}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    active_path: PathBuf,
    backup_path: PathBuf,
}

impl ConfigStore {
    pub fn new(active_path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            active_path: active_path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(&cfg.active_path, &cfg.backup_path)
    }

    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn load_active(&self) -> ServerMap {
        read_document(&self.active_path)
            .map(|doc| servers_from_document(doc, ACTIVE_TABLE, &self.active_path))
            .unwrap_or_default()
    }

    pub fn load_disabled(&self) -> ServerMap {
        read_document(&self.backup_path)
            .map(|doc| servers_from_document(doc, DISABLED_TABLE, &self.backup_path))
            .unwrap_or_default()
    }

    pub fn save_active(&self, servers: &ServerMap) -> Result<(), StoreError> {
        let mut doc = existing_document(&self.active_path)?;
        let table = servers_to_table(servers, &self.active_path)?;
        doc.insert(ACTIVE_TABLE.to_string(), toml::Value::Table(table));
        write_document(&self.active_path, &doc)
    }

    pub fn save_disabled(&self, servers: &ServerMap) -> Result<(), StoreError> {
        let mut doc = toml::Table::new();
        let table = servers_to_table(servers, &self.backup_path)?;
        doc.insert(DISABLED_TABLE.to_string(), toml::Value::Table(table));
        write_document(&self.backup_path, &doc)
    }
}

fn read_document(path: &Path) -> Option<toml::Table> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "config file not present");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable config file, treating as empty");
            return None;
        }
    };
    match text.parse::<toml::Table>() {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unparsable config file, treating as empty");
            None
        }
    }
}

/// The current document for a read-modify-write. Only a missing file counts as empty.
fn existing_document(path: &Path) -> Result<toml::Table, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(toml::Table::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    text.parse::<toml::Table>()
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn servers_from_document(mut doc: toml::Table, key: &str, path: &Path) -> ServerMap {
    let table = match doc.remove(key) {
        Some(toml::Value::Table(table)) => table,
        Some(_) => {
            tracing::warn!(path = %path.display(), key, "expected a table, ignoring");
            return ServerMap::new();
        }
        None => return ServerMap::new(),
    };

    table
        .into_iter()
        .filter_map(|(name, value)| {
            if !value.is_table() {
                tracing::warn!(path = %path.display(), server = %name, "server entry is not a table, skipping");
                return None;
            }
            match value.try_into::<LaunchDefinition>() {
                Ok(def) => Some((name, def)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), server = %name, error = %e, "invalid server entry, skipping");
                    None
                }
            }
        })
        .collect()
}

fn servers_to_table(servers: &ServerMap, path: &Path) -> Result<toml::Table, StoreError> {
    let mut table = toml::Table::new();
    for (name, def) in servers.iter() {
        let value = toml::Value::try_from(def).map_err(|source| StoreError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        table.insert(name.to_string(), value);
    }
    Ok(table)
}

fn write_document(path: &Path, doc: &toml::Table) -> Result<(), StoreError> {
    let text = toml::to_string_pretty(doc).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    atomic_write(path, text.as_bytes()).map_err(io_err)?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "config file written");
    Ok(())
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = {
        let mut name = path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    };

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&tmp_path, path) {
        fs::remove_file(&tmp_path).ok();
        return Err(e);
    }

    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

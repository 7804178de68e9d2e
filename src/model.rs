use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// How to launch one MCP server process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchDefinition {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "env_is_empty")]
    pub env: Option<BTreeMap<String, String>>,
}

fn env_is_empty(env: &Option<BTreeMap<String, String>>) -> bool {
    env.as_ref().map_or(true, BTreeMap::is_empty)
}

impl LaunchDefinition {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: None,
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = if env.is_empty() { None } else { Some(env) };
        self
    }

    /// Command line as a single display string.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Name → definition mapping that keeps file order.
///
/// Replacing an existing name keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerMap {
    entries: Vec<(String, LaunchDefinition)>,
}

impl ServerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&LaunchDefinition> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, def)| def)
    }

    pub fn insert(&mut self, name: impl Into<String>, def: LaunchDefinition) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = def,
            None => self.entries.push((name, def)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<LaunchDefinition> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LaunchDefinition)> {
        self.entries.iter().map(|(n, def)| (n.as_str(), def))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl FromIterator<(String, LaunchDefinition)> for ServerMap {
    fn from_iter<I: IntoIterator<Item = (String, LaunchDefinition)>>(iter: I) -> Self {
        let mut map = ServerMap::new();
        for (name, def) in iter {
            map.insert(name, def);
        }
        map
    }
}

/// A named server together with the partition it currently lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    #[serde(flatten)]
    pub definition: LaunchDefinition,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub name: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// A successful spawn counts as reachable; the process is killed right away
    Launch,
    /// Wait for the process to exit and judge by its exit status
    Exit,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub codex_home: PathBuf,
    pub active_path: PathBuf,
    pub backup_path: PathBuf,
    pub mmcp_path: PathBuf,
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
    pub probe_mode: ProbeMode,
}

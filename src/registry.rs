//! Enable/disable state machine over the two persisted server tables.
//!
//! Nothing is cached: every call re-reads both files and writes back before returning, so
//! each operation sees what is on disk right now. A move between partitions writes the
//! destination file first and the source file second. If the second write fails the server
//! is left in both files (never in neither) and [`RegistryError::PartialWrite`] is returned.
//! When loading, a name found in both files counts as active and the backup copy is ignored.

use crate::model::{Entry, LaunchDefinition, ServerMap};
use crate::storage::{ConfigStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("server '{0}' not found")]
    NotFound(String),
    #[error("server '{0}' already exists")]
    DuplicateName(String),
    #[error("invalid server definition: {0}")]
    InvalidDefinition(String),
    #[error(transparent)]
    Persistence(#[from] StoreError),
    #[error("server '{name}' was only partially moved and may be listed in both config files")]
    PartialWrite {
        name: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partition {
    Active,
    Disabled,
}

impl Partition {
    fn other(self) -> Self {
        match self {
            Partition::Active => Partition::Disabled,
            Partition::Disabled => Partition::Active,
        }
    }
}

pub struct Registry {
    store: ConfigStore,
}

impl Registry {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Active servers in file order, then disabled servers in file order.
    pub fn list(&self) -> Vec<Entry> {
        let (active, disabled) = self.load();
        let enabled = active.iter().map(|(name, def)| (name, def, true));
        let parked = disabled.iter().map(|(name, def)| (name, def, false));
        enabled
            .chain(parked)
            .map(|(name, def, enabled)| Entry {
                name: name.to_string(),
                definition: def.clone(),
                enabled,
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Entry> {
        self.list().into_iter().find(|e| e.name == name)
    }

    pub fn add(&self, name: &str, definition: LaunchDefinition) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidDefinition(
                "server name must not be empty".into(),
            ));
        }
        if definition.command.trim().is_empty() {
            return Err(RegistryError::InvalidDefinition(format!(
                "server '{name}' needs a command"
            )));
        }

        let (mut active, disabled) = self.load();
        if active.contains(name) || disabled.contains(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        active.insert(name, definition);
        self.store.save_active(&active)?;
        tracing::info!(server = name, "server added");
        Ok(())
    }

    /// Move `name` to the other partition and return its new enabled state.
    pub fn toggle(&self, name: &str) -> Result<bool, RegistryError> {
        let (mut active, mut disabled) = self.load();

        if let Some(def) = active.remove(name) {
            disabled.insert(name, def);
            self.persist_move(name, Partition::Disabled, &active, &disabled)?;
            tracing::info!(server = name, "server disabled");
            return Ok(false);
        }
        if let Some(def) = disabled.remove(name) {
            active.insert(name, def);
            self.persist_move(name, Partition::Active, &active, &disabled)?;
            tracing::info!(server = name, "server enabled");
            return Ok(true);
        }
        Err(RegistryError::NotFound(name.to_string()))
    }

    /// Returns whether anything changed.
    pub fn enable(&self, name: &str) -> Result<bool, RegistryError> {
        self.ensure_state(name, true)
    }

    /// Returns whether anything changed.
    pub fn disable(&self, name: &str) -> Result<bool, RegistryError> {
        self.ensure_state(name, false)
    }

    fn ensure_state(&self, name: &str, enabled: bool) -> Result<bool, RegistryError> {
        let (active, disabled) = self.load();
        let currently = if active.contains(name) {
            true
        } else if disabled.contains(name) {
            false
        } else {
            return Err(RegistryError::NotFound(name.to_string()));
        };
        if currently == enabled {
            tracing::debug!(server = name, enabled, "server already in requested state");
            return Ok(false);
        }
        self.toggle(name)?;
        Ok(true)
    }

    fn load(&self) -> (ServerMap, ServerMap) {
        let active = self.store.load_active();
        let mut disabled = self.store.load_disabled();
        let stale: Vec<String> = disabled
            .names()
            .filter(|name| active.contains(name))
            .map(str::to_string)
            .collect();
        for name in stale {
            tracing::warn!(server = %name, "server present in both config files, keeping the active copy");
            disabled.remove(&name);
        }
        (active, disabled)
    }

    fn persist_move(
        &self,
        name: &str,
        destination: Partition,
        active: &ServerMap,
        disabled: &ServerMap,
    ) -> Result<(), RegistryError> {
        let write = |partition: Partition| match partition {
            Partition::Active => self.store.save_active(active),
            Partition::Disabled => self.store.save_disabled(disabled),
        };
        write(destination)?;
        write(destination.other()).map_err(|source| RegistryError::PartialWrite {
            name: name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn registry_in(dir: &Path) -> Registry {
        Registry::new(ConfigStore::new(
            dir.join("config.toml"),
            dir.join("cxmcp_backup.toml"),
        ))
    }

    fn echo(arg: &str) -> LaunchDefinition {
        LaunchDefinition::new("echo", vec![arg.to_string()])
    }

    fn assert_exclusive(reg: &Registry) {
        let active = reg.store().load_active();
        let disabled = reg.store().load_disabled();
        for name in active.names() {
            assert!(
                !disabled.contains(name),
                "'{name}' is in both partitions"
            );
        }
    }

    #[test]
    fn toggle_moves_between_files() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        reg.add("alpha", echo("hi")).unwrap();

        assert!(!reg.toggle("alpha").unwrap());

        let entries = reg.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "alpha");
        assert!(!entries[0].enabled);
        assert!(!reg.store().load_active().contains("alpha"));
        assert_eq!(reg.store().load_disabled().get("alpha"), Some(&echo("hi")));
    }

    #[test]
    fn toggle_twice_restores_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        reg.add("alpha", echo("a")).unwrap();
        reg.add("beta", echo("b")).unwrap();
        reg.disable("beta").unwrap();

        let before = reg.list();
        for name in ["alpha", "beta"] {
            reg.toggle(name).unwrap();
            reg.toggle(name).unwrap();
        }
        let mut after = reg.list();
        after.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(before, after);
    }

    #[test]
    fn list_orders_active_before_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        for name in ["c", "a", "b"] {
            reg.add(name, echo(name)).unwrap();
        }
        reg.disable("c").unwrap();

        let listed: Vec<(String, bool)> =
            reg.list().into_iter().map(|e| (e.name, e.enabled)).collect();
        assert_eq!(
            listed,
            vec![
                ("a".to_string(), true),
                ("b".to_string(), true),
                ("c".to_string(), false)
            ]
        );
    }

    #[test]
    fn duplicate_add_keeps_first_definition() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        reg.add("alpha", echo("first")).unwrap();

        let err = reg.add("alpha", echo("second")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(ref n) if n == "alpha"));
        assert_eq!(reg.get("alpha").unwrap().definition, echo("first"));

        reg.disable("alpha").unwrap();
        let err = reg.add("alpha", echo("third")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(_)));
    }

    #[test]
    fn add_rejects_empty_name_or_command() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        assert!(matches!(
            reg.add("  ", echo("x")),
            Err(RegistryError::InvalidDefinition(_))
        ));
        assert!(matches!(
            reg.add("x", LaunchDefinition::default()),
            Err(RegistryError::InvalidDefinition(_))
        ));
        assert!(reg.list().is_empty());
    }

    #[test]
    fn toggle_missing_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());

        let err = reg.toggle("missing").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(ref n) if n == "missing"));
        assert!(!reg.store().active_path().exists());
        assert!(!reg.store().backup_path().exists());
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        reg.add("alpha", echo("hi")).unwrap();

        assert!(!reg.enable("alpha").unwrap());
        assert!(reg.disable("alpha").unwrap());
        assert!(!reg.disable("alpha").unwrap());
        assert!(reg.enable("alpha").unwrap());
        assert!(reg.get("alpha").unwrap().enabled);

        assert!(matches!(
            reg.enable("nope"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            reg.disable("nope"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn names_stay_in_one_partition_across_operations() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        let names = ["a", "b", "c", "d"];
        for name in names {
            reg.add(name, echo(name)).unwrap();
        }
        for step in 0..24 {
            let name = names[step % names.len()];
            match step % 3 {
                0 => {
                    reg.toggle(name).unwrap();
                }
                1 => {
                    reg.disable(name).unwrap();
                }
                _ => {
                    reg.enable(names[(step + 1) % names.len()]).unwrap();
                }
            }
            assert_exclusive(&reg);
            assert_eq!(reg.list().len(), names.len());
        }
    }

    #[test]
    fn failed_destination_write_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        reg.add("alpha", echo("hi")).unwrap();
        std::fs::create_dir(dir.path().join("cxmcp_backup.toml.tmp")).unwrap();

        let err = reg.toggle("alpha").unwrap_err();
        assert!(matches!(err, RegistryError::Persistence(_)));
        assert!(reg.get("alpha").unwrap().enabled);
    }

    #[test]
    fn enable_keeps_unparsable_codex_config_intact() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        reg.add("beta", echo("b")).unwrap();
        reg.disable("beta").unwrap();
        let original = "model = \"o3\"\nmodel = \"o4\"\n[projects.\"/w\"]\ntrust_level = \"trusted\"\n";
        std::fs::write(dir.path().join("config.toml"), original).unwrap();

        let err = reg.enable("beta").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Persistence(StoreError::Parse { .. })
        ));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("config.toml")).unwrap(),
            original
        );
        assert!(reg.store().load_disabled().contains("beta"));
    }

    #[test]
    fn failed_second_write_reports_partial_move_and_heals_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_in(dir.path());
        reg.add("beta", echo("b")).unwrap();
        reg.disable("beta").unwrap();
        std::fs::create_dir(dir.path().join("cxmcp_backup.toml.tmp")).unwrap();

        let err = reg.enable("beta").unwrap_err();
        assert!(matches!(err, RegistryError::PartialWrite { ref name, .. } if name == "beta"));

        // on disk the entry is duplicated; the snapshot shows it once, as active
        assert!(reg.store().load_active().contains("beta"));
        assert!(reg.store().load_disabled().contains("beta"));
        let entries = reg.list();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].enabled);

        std::fs::remove_dir(dir.path().join("cxmcp_backup.toml.tmp")).unwrap();
        reg.disable("beta").unwrap();
        assert_exclusive(&reg);
        assert!(!reg.get("beta").unwrap().enabled);
    }
}

//! Auto-launch ("Run" key) entries
//!
//! Each value under `...\CurrentVersion\Run` names an application and holds the
//! command Windows starts at logon. Writes are idempotent: enabling an existing
//! entry overwrites it, and disabling a missing entry succeeds.

use super::path::{Architecture, RegistryKind, ResolvedPath, Scope, resolve_path};
use crate::config::SelectionDefaults;
use crate::error::{RegScopeError, Result};
use crate::store::{DefaultStore, RegistryNode, RegistryStore, RegistryValue};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One value under a Run key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoLaunchEntry {
    /// Value name
    pub name: String,
    /// Command line stored in the value; empty if the value is not text
    pub executable_path: String,
}

/// Read and write access to the Run keys
///
/// Methods without a scope or architecture argument use the configured
/// [`SelectionDefaults`].
pub struct AutoLaunchRegistry<S = DefaultStore> {
    store: Arc<S>,
    defaults: SelectionDefaults,
}

impl<S> Clone for AutoLaunchRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            defaults: self.defaults,
        }
    }
}

impl AutoLaunchRegistry {
    /// Registry over this platform's store
    pub fn system() -> Self {
        Self::new(DefaultStore::default())
    }
}

impl<S: RegistryStore> AutoLaunchRegistry<S> {
    /// Create a registry over `store`
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            defaults: SelectionDefaults::default(),
        }
    }

    /// Use `defaults` for the methods that omit scope or architecture
    #[must_use]
    pub fn with_defaults(mut self, defaults: SelectionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Register `executable_path` to start at logon under `name`
    ///
    /// Creates the Run key if it is missing and overwrites an existing value.
    pub fn enable(
        &self,
        scope: Scope,
        architecture: Architecture,
        name: &str,
        executable_path: &str,
    ) -> Result<()> {
        require_non_empty("entry name", name)?;
        require_non_empty("executable path", executable_path)?;

        let resolved = run_key(scope, architecture);
        let node = self
            .store
            .open_read_write(resolved.hive, resolved.path)
            .map_err(|e| RegScopeError::store(resolved.location(), e))?;
        node.set_value(name, &RegistryValue::Text(executable_path.to_string()))
            .map_err(|e| RegScopeError::store(resolved.location(), e))?;

        info!("Enabled auto-launch '{name}' in {}", resolved.location());
        Ok(())
    }

    /// [`enable`](Self::enable) with the default architecture
    pub fn enable_for_scope(&self, scope: Scope, name: &str, executable_path: &str) -> Result<()> {
        self.enable(scope, self.defaults.architecture, name, executable_path)
    }

    /// [`enable`](Self::enable) with the default scope and architecture
    pub fn enable_default(&self, name: &str, executable_path: &str) -> Result<()> {
        self.enable(
            self.defaults.scope,
            self.defaults.architecture,
            name,
            executable_path,
        )
    }

    /// Remove the entry `name`; succeeds if it does not exist
    ///
    /// A missing Run key is left missing.
    pub fn disable(&self, scope: Scope, architecture: Architecture, name: &str) -> Result<()> {
        require_non_empty("entry name", name)?;

        let resolved = run_key(scope, architecture);
        let node = match self
            .store
            .open_existing_read_write(resolved.hive, resolved.path)
            .map_err(|e| RegScopeError::store(resolved.location(), e))
        {
            Ok(node) => node,
            Err(e) if e.is_not_found() => {
                debug!("{} does not exist, nothing to disable", resolved.location());
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let removed = node
            .delete_value(name)
            .map_err(|e| RegScopeError::store(resolved.location(), e))?;

        if removed {
            info!("Disabled auto-launch '{name}' in {}", resolved.location());
        } else {
            debug!("Auto-launch '{name}' not present in {}", resolved.location());
        }
        Ok(())
    }

    /// [`disable`](Self::disable) with the default architecture
    pub fn disable_for_scope(&self, scope: Scope, name: &str) -> Result<()> {
        self.disable(scope, self.defaults.architecture, name)
    }

    /// [`disable`](Self::disable) with the default scope and architecture
    pub fn disable_default(&self, name: &str) -> Result<()> {
        self.disable(self.defaults.scope, self.defaults.architecture, name)
    }

    /// Every entry under the Run key, in store order
    ///
    /// Returns an empty list if the key is missing or unreadable.
    pub fn list_entries(&self, scope: Scope, architecture: Architecture) -> Vec<AutoLaunchEntry> {
        let resolved = run_key(scope, architecture);
        match self.read_entries(resolved) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist", resolved.location());
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read {}: {e}", resolved.location());
                Vec::new()
            }
        }
    }

    /// [`list_entries`](Self::list_entries) with the default architecture
    pub fn list_entries_for_scope(&self, scope: Scope) -> Vec<AutoLaunchEntry> {
        self.list_entries(scope, self.defaults.architecture)
    }

    /// [`list_entries`](Self::list_entries) with the default scope and architecture
    pub fn list_default_entries(&self) -> Vec<AutoLaunchEntry> {
        self.list_entries(self.defaults.scope, self.defaults.architecture)
    }

    /// Whether an entry named `name` exists
    pub fn is_enabled(&self, scope: Scope, architecture: Architecture, name: &str) -> Result<bool> {
        Ok(self.entry(scope, architecture, name)?.is_some())
    }

    /// The entry named `name`, if present
    ///
    /// A missing Run key reads as no entry; other store failures are errors.
    pub fn entry(
        &self,
        scope: Scope,
        architecture: Architecture,
        name: &str,
    ) -> Result<Option<AutoLaunchEntry>> {
        require_non_empty("entry name", name)?;

        let resolved = run_key(scope, architecture);
        let node = match self
            .store
            .open_read_only(resolved.hive, resolved.path)
            .map_err(|e| RegScopeError::store(resolved.location(), e))
        {
            Ok(node) => node,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let value = node
            .value(name)
            .map_err(|e| RegScopeError::store(resolved.location(), e))?;
        Ok(value.map(|value| AutoLaunchEntry {
            name: name.to_string(),
            executable_path: text_or_empty(&value),
        }))
    }

    fn read_entries(&self, resolved: ResolvedPath) -> io::Result<Vec<AutoLaunchEntry>> {
        let node = self.store.open_read_only(resolved.hive, resolved.path)?;
        let mut entries = Vec::new();

        for name in node.value_names()? {
            let executable_path = match node.value(&name) {
                Ok(Some(value)) => text_or_empty(&value),
                Ok(None) => continue,
                Err(e) => {
                    debug!("Unreadable value '{name}' in {}: {e}", resolved.location());
                    String::new()
                }
            };
            entries.push(AutoLaunchEntry {
                name,
                executable_path,
            });
        }

        Ok(entries)
    }
}

fn run_key(scope: Scope, architecture: Architecture) -> ResolvedPath {
    resolve_path(scope, architecture, RegistryKind::AutoLaunch)
}

fn text_or_empty(value: &RegistryValue) -> String {
    value.as_text().unwrap_or_default().to_string()
}

fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(RegScopeError::InvalidArgument(format!("{what} is empty")));
    }
    Ok(())
}

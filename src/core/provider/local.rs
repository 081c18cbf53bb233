//! Local provider.
//!
//! Persists a [`MemoryState`] as JSON in a directory (`<path>/store.json`).
//! Every mutation locks the store, re-reads it, applies the change and
//! replaces the file atomically.
//!
//! ## Usage
//!
//! ```text
//! nsm provider add offline local --path ~/secrets-store
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;

use super::{MemoryState, Provider};
use crate::core::config::expand_home;
use crate::core::domain::{FolderRef, OrgRef, ResourceRef};
use crate::core::registry::ProviderConfig;
use crate::core::storage::{self, FileLock};
use crate::core::types::{FolderId, ResourceId};
use crate::error::{ConfigError, Result, StateError};

const STORE_FILE: &str = "store.json";

/// Directory-backed provider.
#[derive(Debug, Clone)]
pub struct Local {
    store: PathBuf,
}

impl Local {
    /// Open (or lazily create) a store in `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            store: dir.as_ref().join(STORE_FILE),
        }
    }

    /// Build from a registry entry; requires the `path` connection setting.
    /// A leading `~` is expanded.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let dir = config
            .setting("path")
            .ok_or_else(|| ConfigError::MissingConnection {
                provider: config.name.clone(),
                field: "path",
            })?;
        Ok(Self::new(expand_home(dir)))
    }

    fn load(&self) -> Result<MemoryState> {
        if !self.store.exists() {
            return Ok(MemoryState::default());
        }
        let contents = std::fs::read(&self.store).map_err(|source| ConfigError::ReadFile {
            path: self.store.clone(),
            source,
        })?;
        serde_json::from_slice(&contents).map_err(|e| {
            StateError::Corrupt {
                path: self.store.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut MemoryState) -> Result<T>) -> Result<T> {
        let _lock = FileLock::acquire(&storage::lock_path(&self.store))?;
        let mut state = self.load()?;
        let out = f(&mut state)?;
        storage::write_atomic(&self.store, &serde_json::to_vec_pretty(&state)?)?;
        debug!(store = %self.store.display(), "local store updated");
        Ok(out)
    }
}

impl Provider for Local {
    fn name(&self) -> &'static str {
        "local"
    }

    fn list_organizations(&self) -> Result<Vec<OrgRef>> {
        Ok(self.load()?.organizations())
    }

    fn list_projects(&self, root: Option<&str>) -> Result<Vec<FolderRef>> {
        Ok(self.load()?.projects(root))
    }

    fn create_folder(&self, parent: Option<&str>, name: &str) -> Result<FolderId> {
        // avoid rewriting the store when the folder already exists
        let existing = self
            .load()?
            .projects(parent)
            .into_iter()
            .find(|f| f.name == name && f.parent.as_deref() == parent);
        if let Some(folder) = existing {
            return Ok(folder.id);
        }
        self.mutate(|state| state.create_folder(parent, name).map(|(id, _)| id))
    }

    fn list_resources(&self, folder: &str) -> Result<Vec<ResourceRef>> {
        self.load()?.resources(folder)
    }

    fn create_resource(&self, folder: &str, name: &str, value: &[u8]) -> Result<ResourceId> {
        self.mutate(|state| state.create_resource(folder, name, value))
    }

    fn update_resource(&self, id: &str, value: &[u8]) -> Result<()> {
        self.mutate(|state| state.update_resource(id, value))
    }

    fn get_resource_value(&self, id: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.load()?.resource_value(id)
    }

    fn delete_resource(&self, id: &str) -> Result<()> {
        self.mutate(|state| state.delete_resource(id))
    }
}

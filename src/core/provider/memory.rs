//! In-memory provider.
//!
//! Holds folders and versioned resources in a [`MemoryState`]. The same state
//! type backs the `local` provider on disk. Failures can be injected per
//! resource name or id to exercise partial-failure handling.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::trace;
use zeroize::Zeroizing;

use super::Provider;
use crate::core::domain::{FolderRef, OrgRef, ResourceRef};
use crate::core::types::{FolderId, ResourceId};
use crate::error::{ProviderError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredFolder {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<FolderId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredResource {
    name: String,
    folder: FolderId,
    /// Oldest first; the last entry is the current value.
    versions: Vec<Vec<u8>>,
}

/// Folders and resources of a provider that lives in this process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryState {
    #[serde(default)]
    folders: BTreeMap<FolderId, StoredFolder>,
    #[serde(default)]
    resources: BTreeMap<ResourceId, StoredResource>,
}

impl MemoryState {
    /// Top-level folders act as organizations.
    pub fn organizations(&self) -> Vec<OrgRef> {
        self.folders
            .iter()
            .filter(|(_, f)| f.parent.is_none())
            .map(|(id, f)| OrgRef {
                id: id.clone(),
                name: f.name.clone(),
            })
            .collect()
    }

    pub fn projects(&self, root: Option<&str>) -> Vec<FolderRef> {
        self.folders
            .iter()
            .filter(|(_, f)| root.is_none() || f.parent.as_deref() == root)
            .map(|(id, f)| FolderRef {
                id: id.clone(),
                name: f.name.clone(),
                parent: f.parent.clone(),
            })
            .collect()
    }

    /// Find or create a folder; the flag tells whether it was created.
    pub fn create_folder(&mut self, parent: Option<&str>, name: &str) -> Result<(FolderId, bool)> {
        if let Some(parent) = parent {
            if !self.folders.contains_key(parent) {
                return Err(ProviderError::folder(parent).into());
            }
        }

        if let Some((id, _)) = self
            .folders
            .iter()
            .find(|(_, f)| f.name == name && f.parent.as_deref() == parent)
        {
            return Ok((id.clone(), false));
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.folders.insert(
            id.clone(),
            StoredFolder {
                name: name.to_string(),
                parent: parent.map(str::to_string),
            },
        );
        Ok((id, true))
    }

    pub fn resources(&self, folder: &str) -> Result<Vec<ResourceRef>> {
        if !self.folders.contains_key(folder) {
            return Err(ProviderError::folder(folder).into());
        }
        Ok(self
            .resources
            .iter()
            .filter(|(_, r)| r.folder == folder)
            .map(|(id, r)| ResourceRef {
                id: id.clone(),
                name: r.name.clone(),
                folder: Some(r.folder.clone()),
            })
            .collect())
    }

    pub fn create_resource(&mut self, folder: &str, name: &str, value: &[u8]) -> Result<ResourceId> {
        if !self.folders.contains_key(folder) {
            return Err(ProviderError::folder(folder).into());
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.resources.insert(
            id.clone(),
            StoredResource {
                name: name.to_string(),
                folder: folder.to_string(),
                versions: vec![value.to_vec()],
            },
        );
        Ok(id)
    }

    pub fn update_resource(&mut self, id: &str, value: &[u8]) -> Result<()> {
        let resource = self
            .resources
            .get_mut(id)
            .ok_or_else(|| ProviderError::resource(id))?;
        resource.versions.push(value.to_vec());
        Ok(())
    }

    pub fn resource_value(&self, id: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.resources
            .get(id)
            .and_then(|r| r.versions.last())
            .map(|v| Zeroizing::new(v.clone()))
            .ok_or_else(|| ProviderError::resource(id).into())
    }

    pub fn delete_resource(&mut self, id: &str) -> Result<()> {
        self.resources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ProviderError::resource(id).into())
    }

    /// Number of stored versions of a resource.
    pub fn version_count(&self, id: &str) -> usize {
        self.resources.get(id).map_or(0, |r| r.versions.len())
    }

    /// Number of folders.
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    fn resource_name(&self, id: &str) -> Option<&str> {
        self.resources.get(id).map(|r| r.name.as_str())
    }
}

/// Provider backed by process memory.
#[derive(Debug, Default)]
pub struct Memory {
    state: Mutex<MemoryState>,
    failures: Mutex<BTreeMap<String, ProviderError>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: MemoryState) -> Self {
        Self {
            state: Mutex::new(state),
            failures: Mutex::default(),
        }
    }

    /// Make every call touching the resource `target` (a name or an id) fail.
    pub fn fail_on(&self, target: impl Into<String>, err: ProviderError) {
        lock(&self.failures).insert(target.into(), err);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> MemoryState {
        lock(&self.state).clone()
    }

    fn check(&self, name: Option<&str>, id: Option<&str>) -> Result<()> {
        let failures = lock(&self.failures);
        for target in [name, id].into_iter().flatten() {
            if let Some(err) = failures.get(target) {
                trace!(target = %target, "injected failure");
                return Err(err.clone().into());
            }
        }
        Ok(())
    }

    fn check_id(&self, id: &str) -> Result<()> {
        let name = lock(&self.state).resource_name(id).map(str::to_string);
        self.check(name.as_deref(), Some(id))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Provider for Memory {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn list_organizations(&self) -> Result<Vec<OrgRef>> {
        Ok(lock(&self.state).organizations())
    }

    fn list_projects(&self, root: Option<&str>) -> Result<Vec<FolderRef>> {
        Ok(lock(&self.state).projects(root))
    }

    fn create_folder(&self, parent: Option<&str>, name: &str) -> Result<FolderId> {
        self.check(Some(name), None)?;
        lock(&self.state)
            .create_folder(parent, name)
            .map(|(id, _)| id)
    }

    fn list_resources(&self, folder: &str) -> Result<Vec<ResourceRef>> {
        self.check(None, Some(folder))?;
        lock(&self.state).resources(folder)
    }

    fn create_resource(&self, folder: &str, name: &str, value: &[u8]) -> Result<ResourceId> {
        self.check(Some(name), None)?;
        lock(&self.state).create_resource(folder, name, value)
    }

    fn update_resource(&self, id: &str, value: &[u8]) -> Result<()> {
        self.check_id(id)?;
        lock(&self.state).update_resource(id, value)
    }

    fn get_resource_value(&self, id: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.check_id(id)?;
        lock(&self.state).resource_value(id)
    }

    fn delete_resource(&self, id: &str) -> Result<()> {
        self.check_id(id)?;
        lock(&self.state).delete_resource(id)
    }
}

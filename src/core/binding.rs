//! Project bindings.
//!
//! A binding maps a local project directory to a remote folder on one
//! provider. Bindings live in `projects.toml` under the state directory:
//!
//! ```toml
//! [[bindings]]
//! local_path = "/home/me/work/api"
//! provider = "work"
//! folder_id = "0c1d..."
//! folder_name = "api"
//! created = "2026-01-05T10:12:00Z"
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::Paths;
use crate::core::storage::{self, FileLock};
use crate::core::types::{FolderId, ProviderName};
use crate::error::{ConfigError, Result};

/// A directory bound to a remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBinding {
    pub local_path: PathBuf,
    pub provider: ProviderName,
    pub folder_id: FolderId,
    pub folder_name: String,
    pub created: DateTime<Utc>,
}

impl ProjectBinding {
    pub fn new(
        local_path: impl AsRef<Path>,
        provider: impl Into<String>,
        folder_id: impl Into<String>,
        folder_name: impl Into<String>,
    ) -> Self {
        Self {
            local_path: normalize(local_path.as_ref()),
            provider: provider.into(),
            folder_id: folder_id.into(),
            folder_name: folder_name.into(),
            created: Utc::now(),
        }
    }

    fn matches(&self, path: &Path, provider: &str) -> bool {
        self.local_path == path && self.provider == provider
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BindingState {
    #[serde(default)]
    bindings: Vec<ProjectBinding>,
}

/// Handle to the bindings file.
#[derive(Debug, Clone)]
pub struct Bindings {
    path: PathBuf,
}

impl Bindings {
    pub fn open(paths: &Paths) -> Self {
        Self::at(paths.bindings())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record a binding, replacing the one for the same directory and
    /// provider. Returns the replaced binding, if any.
    pub fn bind(&self, binding: ProjectBinding) -> Result<Option<ProjectBinding>> {
        let previous = self.mutate(|state| {
            let previous = state
                .bindings
                .iter()
                .position(|b| b.matches(&binding.local_path, &binding.provider))
                .map(|i| state.bindings.remove(i));
            state.bindings.push(binding.clone());
            previous
        })?;

        info!(
            path = %binding.local_path.display(),
            provider = %binding.provider,
            folder = %binding.folder_id,
            "project bound"
        );
        Ok(previous)
    }

    /// Binding for `dir` on `provider`, if any.
    pub fn find(&self, dir: &Path, provider: &str) -> Result<Option<ProjectBinding>> {
        let dir = normalize(dir);
        Ok(self
            .load()?
            .bindings
            .into_iter()
            .find(|b| b.matches(&dir, provider)))
    }

    /// Like [`find`](Self::find), but a missing binding is an error.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoBinding`.
    pub fn require(&self, dir: &Path, provider: &str) -> Result<ProjectBinding> {
        self.find(dir, provider)?.ok_or_else(|| {
            ConfigError::NoBinding {
                path: normalize(dir),
                provider: provider.to_string(),
            }
            .into()
        })
    }

    /// Drop the binding for `dir` on `provider`. Returns it if one existed.
    pub fn unbind(&self, dir: &Path, provider: &str) -> Result<Option<ProjectBinding>> {
        let dir = normalize(dir);
        let removed = self.mutate(|state| {
            state
                .bindings
                .iter()
                .position(|b| b.matches(&dir, provider))
                .map(|i| state.bindings.remove(i))
        })?;

        if removed.is_some() {
            info!(path = %dir.display(), provider = %provider, "project unbound");
        }
        Ok(removed)
    }

    /// All bindings, ordered by path then provider.
    pub fn list(&self) -> Result<Vec<ProjectBinding>> {
        let mut bindings = self.load()?.bindings;
        bindings.sort_by(|a, b| {
            a.local_path
                .cmp(&b.local_path)
                .then_with(|| a.provider.cmp(&b.provider))
        });
        Ok(bindings)
    }

    fn load(&self) -> Result<BindingState> {
        storage::read_toml(&self.path)
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut BindingState) -> T) -> Result<T> {
        let _lock = FileLock::acquire(&storage::lock_path(&self.path))?;
        let mut state = self.load()?;
        let out = f(&mut state);
        storage::write_toml(&self.path, &state)?;
        debug!(path = %self.path.display(), "bindings saved");
        Ok(out)
    }
}

/// Canonical form of a project directory, so `.` and its absolute path bind
/// the same project.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

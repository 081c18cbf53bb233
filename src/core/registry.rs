//! Provider registry.
//!
//! Registered providers and the active selection, persisted in
//! `providers.toml` under the state directory:
//!
//! ```toml
//! active = "work"
//!
//! [providers.work]
//! kind = "passbolt"
//! organization_root_folder = "9e03fd1c-..."
//! added = "2026-01-05T10:12:00Z"
//!
//! [providers.work.connection]
//! server = "https://passbolt.example.com"
//! passphrase_env = "PASSBOLT_PASSPHRASE"
//! ```
//!
//! Credentials are referenced by path or environment variable name, never
//! stored inline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::config::Paths;
use crate::core::constants;
use crate::core::provider::ProviderKind;
use crate::core::storage::{self, FileLock};
use crate::core::types::{FolderId, ProviderName};
use crate::error::{ConfigError, Result};

/// One registered provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry key; filled in from the table name when loading.
    #[serde(skip)]
    pub name: ProviderName,
    pub kind: ProviderKind,
    /// Folder under which projects are listed and created by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_root_folder: Option<FolderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<DateTime<Utc>>,
    /// Backend-specific settings (server, key file, env var names, path).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub connection: BTreeMap<String, String>,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            connection: BTreeMap::new(),
            organization_root_folder: None,
            added: None,
        }
    }

    /// Builder-style connection setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.connection.insert(key.into(), value.into());
        self
    }

    /// Connection setting by name; empty values count as unset.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.connection
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Copy with secret-bearing connection values masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for (field, value) in copy.connection.iter_mut() {
            if is_sensitive(field) {
                *value = constants::REDACTED.to_string();
            }
        }
        copy
    }
}

fn is_sensitive(field: &str) -> bool {
    let field = field.to_ascii_lowercase();
    constants::REDACTED_FIELDS
        .iter()
        .any(|needle| field.contains(needle))
}

/// Whether `add` created a new entry or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Replaced,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active: Option<ProviderName>,
    #[serde(default)]
    providers: BTreeMap<ProviderName, ProviderConfig>,
}

/// Handle to the registry file.
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
}

impl Registry {
    pub fn open(paths: &Paths) -> Self {
        Self::at(paths.registry())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a provider, replacing any entry with the same name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidName` for an unusable name.
    pub fn add(&self, mut config: ProviderConfig) -> Result<AddOutcome> {
        validate_name(&config.name)?;
        if config.added.is_none() {
            config.added = Some(Utc::now());
        }

        let name = config.name.clone();
        let outcome = self.mutate(|state| {
            let outcome = match state.providers.insert(name.clone(), config) {
                Some(_) => AddOutcome::Replaced,
                None => AddOutcome::Added,
            };
            Ok(outcome)
        })?;

        match outcome {
            AddOutcome::Replaced => warn!(provider = %name, "provider replaced"),
            AddOutcome::Added => info!(provider = %name, "provider added"),
        }
        Ok(outcome)
    }

    /// Unregister a provider.
    ///
    /// The active provider is only removed with `force`, which also clears
    /// the selection.
    ///
    /// # Errors
    ///
    /// `ConfigError::ProviderNotFound` if unknown,
    /// `ConfigError::ActiveProviderInUse` if active and `force` is false.
    pub fn remove(&self, name: &str, force: bool) -> Result<()> {
        self.mutate(|state| {
            if !state.providers.contains_key(name) {
                return Err(ConfigError::ProviderNotFound(name.to_string()).into());
            }
            if state.active.as_deref() == Some(name) {
                if !force {
                    return Err(ConfigError::ActiveProviderInUse(name.to_string()).into());
                }
                warn!(provider = %name, "removing active provider, selection cleared");
                state.active = None;
            }
            state.providers.remove(name);
            Ok(())
        })?;

        info!(provider = %name, "provider removed");
        Ok(())
    }

    /// Select the active provider.
    ///
    /// # Errors
    ///
    /// `ConfigError::ProviderNotFound` if unknown; the previous selection is
    /// kept.
    pub fn use_provider(&self, name: &str) -> Result<()> {
        self.mutate(|state| {
            if !state.providers.contains_key(name) {
                return Err(ConfigError::ProviderNotFound(name.to_string()).into());
            }
            state.active = Some(name.to_string());
            Ok(())
        })?;

        info!(provider = %name, "active provider set");
        Ok(())
    }

    /// All providers sorted by name, with secrets redacted.
    pub fn list(&self) -> Result<Vec<ProviderConfig>> {
        Ok(self
            .load()?
            .providers
            .values()
            .map(ProviderConfig::redacted)
            .collect())
    }

    /// Provider by name.
    pub fn get(&self, name: &str) -> Result<ProviderConfig> {
        self.load()?
            .providers
            .remove(name)
            .ok_or_else(|| ConfigError::ProviderNotFound(name.to_string()).into())
    }

    /// Name of the active provider, if one is selected.
    pub fn active_name(&self) -> Result<Option<ProviderName>> {
        Ok(self.load()?.active)
    }

    /// The active provider's configuration.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoActiveProvider` if none is selected.
    pub fn active(&self) -> Result<ProviderConfig> {
        let mut state = self.load()?;
        let name = state.active.ok_or(ConfigError::NoActiveProvider)?;
        state
            .providers
            .remove(&name)
            .ok_or_else(|| ConfigError::ProviderNotFound(name).into())
    }

    /// Resolve an explicit override or fall back to the active provider.
    pub fn resolve(&self, name: Option<&str>) -> Result<ProviderConfig> {
        match name {
            Some(name) => self.get(name),
            None => self.active(),
        }
    }

    fn load(&self) -> Result<RegistryState> {
        let mut state: RegistryState = storage::read_toml(&self.path)?;
        for (name, config) in state.providers.iter_mut() {
            config.name = name.clone();
        }
        Ok(state)
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut RegistryState) -> Result<T>) -> Result<T> {
        let _lock = FileLock::acquire(&storage::lock_path(&self.path))?;
        let mut state = self.load()?;
        let out = f(&mut state)?;
        storage::write_toml(&self.path, &state)?;
        debug!(path = %self.path.display(), "registry saved");
        Ok(out)
    }
}

/// Provider names are used as TOML keys and on the command line.
fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(ConfigError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }
        .into())
    };

    if name.is_empty() {
        return invalid("cannot be empty");
    }
    if name.starts_with('-') {
        return invalid("cannot start with '-'");
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.'))
    {
        return invalid(&format!(
            "invalid character '{}'; use letters, digits, '-', '_' or '.'",
            ch
        ));
    }
    Ok(())
}

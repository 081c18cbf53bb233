//! Secret providers.
//!
//! A provider is a remote secrets backend organized as folders of named
//! resources. The sync engine only talks to the [`Provider`] trait; each
//! backend kind has one adapter.
//!
//! ## Backends
//!
//! - **passbolt**: drives the `passbolt` CLI. Folders are Passbolt folders,
//!   resources are password entries.
//! - **bitwarden**: drives the Bitwarden Secrets Manager `bws` CLI. Folders are
//!   projects, resources are secrets.
//! - **gcp**: drives `gcloud` for Google Cloud Secret Manager. Folders are
//!   Google Cloud projects, resources are secrets.
//! - **local**: a JSON file in a directory, for offline use and tests.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Provider` trait in a new file
//! 2. Add a variant to `ProviderKind`
//! 3. Construct it in `open`

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::core::domain::{FolderRef, OrgRef, ResourceRef};
use crate::core::registry::ProviderConfig;
use crate::core::types::{FolderId, ResourceId};
use crate::error::{ConfigError, Result};

mod bitwarden;
mod command;
mod gcp;
mod keychain;
mod local;
mod memory;
mod passbolt;

pub use bitwarden::Bitwarden;
pub use gcp::Gcp;
pub use local::Local;
pub use memory::{Memory, MemoryState};
pub use passbolt::Passbolt;

/// Capability contract every backend implements.
///
/// All calls are synchronous from the caller's side and safe to retry.
/// Values are raw bytes; decryption, if any, happens inside the adapter.
pub trait Provider {
    /// Backend name for logs and display.
    fn name(&self) -> &'static str;

    /// Organizations visible to the configured credentials.
    ///
    /// Empty if the backend has no organization concept.
    fn list_organizations(&self) -> Result<Vec<OrgRef>>;

    /// Project folders, optionally restricted to children of `root`.
    fn list_projects(&self, root: Option<&str>) -> Result<Vec<FolderRef>>;

    /// Create a folder under `parent` (top level when `None`).
    ///
    /// Idempotent: if a folder with the same name already exists under the
    /// same parent its id is returned and nothing is created.
    ///
    /// # Errors
    ///
    /// `ProviderError::NotFound` if the parent does not exist,
    /// `ProviderError::PermissionDenied` if creation is not allowed.
    fn create_folder(&self, parent: Option<&str>, name: &str) -> Result<FolderId>;

    /// Resources stored directly in `folder`.
    fn list_resources(&self, folder: &str) -> Result<Vec<ResourceRef>>;

    /// Create a resource holding `value`.
    fn create_resource(&self, folder: &str, name: &str, value: &[u8]) -> Result<ResourceId>;

    /// Store a new version of a resource.
    fn update_resource(&self, id: &str, value: &[u8]) -> Result<()>;

    /// Latest version of a resource's value.
    ///
    /// # Errors
    ///
    /// `ProviderError::NotFound`, `ProviderError::DecryptionFailed` or
    /// `ProviderError::PermissionDenied`.
    fn get_resource_value(&self, id: &str) -> Result<Zeroizing<Vec<u8>>>;

    /// Delete a resource and its history.
    fn delete_resource(&self, id: &str) -> Result<()>;
}

/// Supported backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Passbolt,
    Bitwarden,
    Gcp,
    Local,
}

impl ProviderKind {
    pub const ALL: &'static [ProviderKind] = &[
        ProviderKind::Passbolt,
        ProviderKind::Bitwarden,
        ProviderKind::Gcp,
        ProviderKind::Local,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Passbolt => "passbolt",
            ProviderKind::Bitwarden => "bitwarden",
            ProviderKind::Gcp => "gcp",
            ProviderKind::Local => "local",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passbolt" => Ok(ProviderKind::Passbolt),
            "bitwarden" | "bws" => Ok(ProviderKind::Bitwarden),
            "gcp" | "gcloud" | "google" => Ok(ProviderKind::Gcp),
            "local" => Ok(ProviderKind::Local),
            other => Err(ConfigError::UnsupportedKind(other.to_string())),
        }
    }
}

/// Construct the adapter for a registered provider.
///
/// # Errors
///
/// Returns `ConfigError::MissingConnection` when a required connection
/// setting is absent.
pub fn open(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    tracing::debug!(provider = %config.name, kind = %config.kind, "opening provider");

    let provider: Box<dyn Provider> = match config.kind {
        ProviderKind::Passbolt => Box::new(Passbolt::from_config(config)),
        ProviderKind::Bitwarden => Box::new(Bitwarden::from_config(config)),
        ProviderKind::Gcp => Box::new(Gcp::from_config(config)),
        ProviderKind::Local => Box::new(Local::from_config(config)?),
    };
    Ok(provider)
}

/// Decode a fetched value as UTF-8 text.
///
/// Secret files are text, so a binary payload is treated as undecryptable.
pub fn value_to_string(id: &str, bytes: &[u8]) -> Result<Zeroizing<String>> {
    std::str::from_utf8(bytes)
        .map(|s| Zeroizing::new(s.to_string()))
        .map_err(|_| {
            crate::error::ProviderError::DecryptionFailed(format!(
                "resource {} is not valid UTF-8",
                id
            ))
            .into()
        })
}

//! Passbolt provider.
//!
//! Drives the `passbolt` CLI (go-passbolt-cli) with `--json` output.
//! Passbolt folders are project folders; each secret key is a password
//! resource whose name is the key and whose password is the value.
//!
//! ## Requirements
//!
//! - `passbolt` CLI on PATH
//! - Either a configured CLI (`passbolt configure`) or the connection
//!   settings below
//!
//! ## Connection settings
//!
//! ```toml
//! [providers.work]
//! kind = "passbolt"
//! organization_root_folder = "9e03fd1c-..."
//!
//! [providers.work.connection]
//! server = "https://passbolt.example.com"
//! private_key_file = "~/.config/passbolt/private.asc"
//! passphrase_env = "PASSBOLT_PASSPHRASE"
//! ```

use serde::Deserialize;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::command::{OneOrMany, Tool};
use super::Provider;
use crate::core::config::expand_home;
use crate::core::domain::{FolderRef, OrgRef, ResourceRef};
use crate::core::registry::ProviderConfig;
use crate::core::types::{FolderId, ResourceId};
use crate::error::{ProviderError, Result};

/// Variable go-passbolt-cli reads the private key passphrase from.
const PASSPHRASE_ENV: &str = "PASSBOLT_USERPASSWORD";

#[derive(Debug, Deserialize)]
struct FolderEntry {
    #[serde(alias = "ID")]
    id: String,
    #[serde(alias = "Name")]
    name: String,
    #[serde(default, alias = "FolderParentID")]
    folder_parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceEntry {
    #[serde(alias = "ID")]
    id: String,
    #[serde(alias = "Name")]
    name: String,
    #[serde(default, alias = "FolderParentID")]
    folder_parent_id: Option<String>,
}

#[derive(Deserialize)]
struct SecretEntry {
    #[serde(default, alias = "Password")]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Created {
    #[serde(alias = "ID")]
    id: String,
}

/// Passbolt backend.
#[derive(Debug, Clone)]
pub struct Passbolt {
    tool: Tool,
}

impl Passbolt {
    /// Build from a registry entry. All connection settings are optional;
    /// missing ones fall back to the CLI's own configuration.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut tool = Tool::new("passbolt");

        if let Some(server) = config.setting("server") {
            tool = tool.base_arg("--serverAddress").base_arg(server);
        }
        if let Some(key_file) = config.setting("private_key_file") {
            tool = tool
                .base_arg("--userPrivateKeyFile")
                .base_arg(expand_home(key_file).display().to_string());
        }
        // credentials never go in argv; the CLI also reads PASSBOLT_* variables
        if let Some(var) = config.setting("passphrase_env") {
            match std::env::var(var) {
                Ok(passphrase) => tool = tool.env(PASSPHRASE_ENV, Zeroizing::new(passphrase)),
                Err(_) => warn!(var = %var, "passphrase variable not set"),
            }
        }

        Self { tool }
    }

    fn folders(&self) -> Result<Vec<FolderEntry>> {
        let folders: OneOrMany<FolderEntry> = self.tool.run_json(&["list", "folder", "--json"])?;
        Ok(folders.into_vec())
    }
}

fn parent_of(entry: &FolderEntry) -> Option<&str> {
    entry
        .folder_parent_id
        .as_deref()
        .filter(|p| !p.is_empty())
}

impl Provider for Passbolt {
    fn name(&self) -> &'static str {
        "passbolt"
    }

    fn list_organizations(&self) -> Result<Vec<OrgRef>> {
        Ok(self
            .folders()?
            .into_iter()
            .filter(|f| parent_of(f).is_none())
            .map(|f| OrgRef {
                id: f.id,
                name: f.name,
            })
            .collect())
    }

    fn list_projects(&self, root: Option<&str>) -> Result<Vec<FolderRef>> {
        Ok(self
            .folders()?
            .into_iter()
            .filter(|f| root.is_none() || parent_of(f) == root)
            .map(|f| FolderRef {
                parent: parent_of(&f).map(str::to_string),
                id: f.id,
                name: f.name,
            })
            .collect())
    }

    fn create_folder(&self, parent: Option<&str>, name: &str) -> Result<FolderId> {
        let folders = self.folders()?;

        if let Some(parent) = parent {
            if !folders.iter().any(|f| f.id == parent) {
                return Err(ProviderError::folder(parent).into());
            }
        }
        if let Some(existing) = folders
            .iter()
            .find(|f| f.name == name && parent_of(f) == parent)
        {
            debug!(folder = %existing.id, "folder already exists");
            return Ok(existing.id.clone());
        }

        let mut args = vec!["create", "folder", "--name", name];
        if let Some(parent) = parent {
            args.extend(["--folderParentID", parent]);
        }
        args.push("--json");

        let created: OneOrMany<Created> = self.tool.run_json(&args)?;
        created.into_first().map(|c| c.id).ok_or_else(|| {
            ProviderError::InvalidResponse {
                backend: "passbolt",
                reason: "create folder returned no id".to_string(),
            }
            .into()
        })
    }

    fn list_resources(&self, folder: &str) -> Result<Vec<ResourceRef>> {
        let filter = format!("(FolderParentID == \"{}\")", folder);
        let resources: OneOrMany<ResourceEntry> =
            self.tool
                .run_json(&["list", "resource", "--filter", &filter, "--json"])?;

        Ok(resources
            .into_vec()
            .into_iter()
            .filter(|r| r.folder_parent_id.as_deref().map_or(true, |p| p == folder))
            .map(|r| ResourceRef {
                id: r.id,
                name: r.name,
                folder: Some(folder.to_string()),
            })
            .collect())
    }

    fn create_resource(&self, folder: &str, name: &str, value: &[u8]) -> Result<ResourceId> {
        let value = super::value_to_string(name, value)?;
        let created: OneOrMany<Created> = self.tool.run_json(&[
            "create",
            "resource",
            "--name",
            name,
            "--password",
            value.as_str(),
            "--folderParentID",
            folder,
            "--json",
        ])?;

        created.into_first().map(|c| c.id).ok_or_else(|| {
            ProviderError::InvalidResponse {
                backend: "passbolt",
                reason: "create resource returned no id".to_string(),
            }
            .into()
        })
    }

    fn update_resource(&self, id: &str, value: &[u8]) -> Result<()> {
        let value = super::value_to_string(id, value)?;
        self.tool
            .run(&["update", "resource", "--id", id, "--password", value.as_str()])?;
        Ok(())
    }

    fn get_resource_value(&self, id: &str) -> Result<Zeroizing<Vec<u8>>> {
        let secret: OneOrMany<SecretEntry> =
            self.tool.run_json(&["get", "resource", "--id", id, "--json"])?;

        let password = secret
            .into_first()
            .ok_or_else(|| ProviderError::resource(id))?
            .password
            .unwrap_or_default();
        Ok(Zeroizing::new(password.into_bytes()))
    }

    fn delete_resource(&self, id: &str) -> Result<()> {
        self.tool.run(&["delete", "resource", "--id", id])?;
        Ok(())
    }
}

//! Bitwarden Secrets Manager provider.
//!
//! Drives the `bws` CLI. Bitwarden projects are project folders and their
//! organizations are the organizations; a secret's key is the resource name.
//!
//! The access token is never stored in the registry. It is looked up in:
//!
//! 1. the macOS Keychain, when `keychain_service` or `keychain_org` is set.
//!    With `keychain_org` the service is `bws-<org>-<host>-<year>` (host
//!    without `.local`, current year), account `none`;
//! 2. the environment variable named by `access_token_env` (default
//!    `BWS_ACCESS_TOKEN`).
//!
//! ## Connection settings
//!
//! ```toml
//! [providers.bw]
//! kind = "bitwarden"
//! organization_root_folder = "<organization id>"
//!
//! [providers.bw.connection]
//! access_token_env = "BWS_ACCESS_TOKEN"
//! keychain_org = "acme"
//! server = "https://vault.bitwarden.eu"
//! ```

use std::collections::BTreeSet;

use chrono::Datelike;
use serde::Deserialize;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::command::{OneOrMany, Tool};
use super::Provider;
use crate::core::domain::{FolderRef, OrgRef, ResourceRef};
use crate::core::registry::ProviderConfig;
use crate::core::types::{FolderId, ResourceId};
use crate::error::{ProviderError, Result};

const DEFAULT_TOKEN_ENV: &str = "BWS_ACCESS_TOKEN";

#[cfg(target_os = "macos")]
const KEYCHAIN_ACCOUNT: &str = "none";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectEntry {
    id: String,
    name: String,
    #[serde(default)]
    organization_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretEntry {
    id: String,
    key: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
}

/// Bitwarden Secrets Manager backend.
#[derive(Debug, Clone)]
pub struct Bitwarden {
    tool: Tool,
}

impl Bitwarden {
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut tool = Tool::new("bws").base_arg("--output").base_arg("json");

        if let Some(token) = access_token(config) {
            tool = tool.env(DEFAULT_TOKEN_ENV, token);
        }
        if let Some(server) = config.setting("server") {
            tool = tool.base_arg("--server-url").base_arg(server);
        }

        Self { tool }
    }

    fn projects(&self) -> Result<Vec<ProjectEntry>> {
        let projects: OneOrMany<ProjectEntry> = self.tool.run_json(&["project", "list"])?;
        Ok(projects.into_vec())
    }

    fn secrets(&self, project: &str) -> Result<Vec<SecretEntry>> {
        let secrets: OneOrMany<SecretEntry> =
            self.tool.run_json(&["secret", "list", project])?;
        Ok(secrets.into_vec())
    }
}

fn access_token(config: &ProviderConfig) -> Option<Zeroizing<String>> {
    if let Some(service) = keychain_service(config) {
        match keychain_token(&service) {
            Some(token) => return Some(token),
            None => debug!(service = %service, "no token in keychain, trying environment"),
        }
    }

    let var = config.setting("access_token_env").unwrap_or(DEFAULT_TOKEN_ENV);
    match std::env::var(var) {
        Ok(token) => Some(Zeroizing::new(token)),
        Err(_) => {
            warn!(var = %var, "access token variable not set");
            None
        }
    }
}

/// Keychain service holding the token, if the connection asks for one.
fn keychain_service(config: &ProviderConfig) -> Option<String> {
    if let Some(service) = config.setting("keychain_service") {
        return Some(service.to_string());
    }
    let org = config.setting("keychain_org")?;
    match whoami::fallible::hostname() {
        Ok(host) => Some(token_service(org, &host, chrono::Local::now().year())),
        Err(e) => {
            warn!(error = %e, "hostname unavailable, skipping keychain");
            None
        }
    }
}

fn token_service(org: &str, host: &str, year: i32) -> String {
    let host = host.strip_suffix(".local").unwrap_or(host);
    format!("bws-{}-{}-{}", org, host, year)
}

#[cfg(target_os = "macos")]
fn keychain_token(service: &str) -> Option<Zeroizing<String>> {
    match super::keychain::generic_password(service, KEYCHAIN_ACCOUNT) {
        Ok(token) => token,
        Err(e) => {
            warn!(service = %service, error = %e, "keychain lookup failed");
            None
        }
    }
}

#[cfg(not(target_os = "macos"))]
fn keychain_token(service: &str) -> Option<Zeroizing<String>> {
    debug!(service = %service, "keychain lookup is only available on macOS");
    None
}

impl Provider for Bitwarden {
    fn name(&self) -> &'static str {
        "bitwarden"
    }

    fn list_organizations(&self) -> Result<Vec<OrgRef>> {
        let ids: BTreeSet<String> = self
            .projects()?
            .into_iter()
            .filter_map(|p| p.organization_id)
            .collect();
        Ok(ids
            .into_iter()
            .map(|id| OrgRef {
                name: id.clone(),
                id,
            })
            .collect())
    }

    fn list_projects(&self, root: Option<&str>) -> Result<Vec<FolderRef>> {
        Ok(self
            .projects()?
            .into_iter()
            .filter(|p| root.is_none() || p.organization_id.as_deref() == root)
            .map(|p| FolderRef {
                id: p.id,
                name: p.name,
                parent: p.organization_id,
            })
            .collect())
    }

    fn create_folder(&self, parent: Option<&str>, name: &str) -> Result<FolderId> {
        let projects = self.projects()?;

        if let Some(existing) = projects
            .iter()
            .find(|p| p.name == name && (parent.is_none() || p.organization_id.as_deref() == parent))
        {
            debug!(project = %existing.id, "project already exists");
            return Ok(existing.id.clone());
        }

        // bws creates projects in the token's organization
        if let Some(parent) = parent {
            let known = projects
                .iter()
                .any(|p| p.organization_id.as_deref() == Some(parent));
            if !projects.is_empty() && !known {
                return Err(ProviderError::folder(parent).into());
            }
        }

        let created: OneOrMany<ProjectEntry> =
            self.tool.run_json(&["project", "create", name])?;
        created.into_first().map(|p| p.id).ok_or_else(|| {
            ProviderError::InvalidResponse {
                backend: "bws",
                reason: "project create returned no id".to_string(),
            }
            .into()
        })
    }

    fn list_resources(&self, folder: &str) -> Result<Vec<ResourceRef>> {
        Ok(self
            .secrets(folder)?
            .into_iter()
            .filter(|s| s.project_id.as_deref().map_or(true, |p| p == folder))
            .map(|s| ResourceRef {
                id: s.id,
                name: s.key,
                folder: Some(folder.to_string()),
            })
            .collect())
    }

    fn create_resource(&self, folder: &str, name: &str, value: &[u8]) -> Result<ResourceId> {
        let value = super::value_to_string(name, value)?;
        let created: OneOrMany<SecretEntry> =
            self.tool
                .run_json(&["secret", "create", name, value.as_str(), folder])?;
        created.into_first().map(|s| s.id).ok_or_else(|| {
            ProviderError::InvalidResponse {
                backend: "bws",
                reason: "secret create returned no id".to_string(),
            }
            .into()
        })
    }

    fn update_resource(&self, id: &str, value: &[u8]) -> Result<()> {
        let value = super::value_to_string(id, value)?;
        self.tool
            .run(&["secret", "edit", id, "--value", value.as_str()])?;
        Ok(())
    }

    fn get_resource_value(&self, id: &str) -> Result<Zeroizing<Vec<u8>>> {
        let secret: OneOrMany<SecretEntry> = self.tool.run_json(&["secret", "get", id])?;
        let value = secret
            .into_first()
            .ok_or_else(|| ProviderError::resource(id))?
            .value
            .unwrap_or_default();
        Ok(Zeroizing::new(value.into_bytes()))
    }

    fn delete_resource(&self, id: &str) -> Result<()> {
        self.tool.run(&["secret", "delete", id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_entry_camel_case() {
        let projects: OneOrMany<ProjectEntry> = serde_json::from_str(
            r#"[{"id":"p1","organizationId":"o1","name":"api","creationDate":"2024-01-01"}]"#,
        )
        .unwrap();
        let project = projects.into_first().unwrap();

        assert_eq!(project.id, "p1");
        assert_eq!(project.organization_id.as_deref(), Some("o1"));
    }

    #[test]
    fn test_secret_entry_fields() {
        let secret: OneOrMany<SecretEntry> = serde_json::from_str(
            r#"{"id":"s1","key":"DB_URL","value":"postgres://","projectId":"p1"}"#,
        )
        .unwrap();
        let secret = secret.into_first().unwrap();

        assert_eq!(secret.key, "DB_URL");
        assert_eq!(secret.value.as_deref(), Some("postgres://"));
        assert_eq!(secret.project_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_token_service_name() {
        assert_eq!(
            token_service("adc", "openarms.local", 2025),
            "bws-adc-openarms-2025"
        );
        assert_eq!(token_service("acme", "ci-runner", 2026), "bws-acme-ci-runner-2026");
    }

    #[test]
    fn test_keychain_service_settings() {
        let plain = ProviderConfig::new("bw", crate::core::provider::ProviderKind::Bitwarden);
        assert_eq!(keychain_service(&plain), None);

        let explicit = plain.clone().with_setting("keychain_service", "bws-token");
        assert_eq!(keychain_service(&explicit).as_deref(), Some("bws-token"));

        let by_org = plain.with_setting("keychain_org", "acme");
        if let Some(service) = keychain_service(&by_org) {
            assert!(service.starts_with("bws-acme-"));
            assert!(service.ends_with(&chrono::Local::now().year().to_string()));
        }
    }

    #[test]
    fn test_token_falls_back_to_environment() {
        std::env::set_var("NSM_TEST_BWS_TOKEN", "0.token");
        let config = ProviderConfig::new("bw", crate::core::provider::ProviderKind::Bitwarden)
            .with_setting("keychain_service", "nsm-test-missing-item")
            .with_setting("access_token_env", "NSM_TEST_BWS_TOKEN");

        let bitwarden = Bitwarden::from_config(&config);

        assert_eq!(bitwarden.tool.env_value(DEFAULT_TOKEN_ENV), Some("0.token"));
        assert!(bitwarden.tool.base_args().iter().all(|a| a != "0.token"));
    }
}

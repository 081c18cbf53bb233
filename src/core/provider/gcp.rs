//! Google Cloud Secret Manager provider.
//!
//! Drives the `gcloud` CLI. Google Cloud projects are project folders and
//! their parent organizations are the organizations; each secret key is a
//! Secret Manager secret whose latest version holds the value.
//!
//! Values are written through stdin (`--data-file=-`) and authentication is
//! left to gcloud's own credentials unless an access token file is named.
//!
//! ## Connection settings
//!
//! ```toml
//! [providers.gcp]
//! kind = "gcp"
//! organization_root_folder = "123456789012"
//!
//! [providers.gcp.connection]
//! account = "ci@example.iam.gserviceaccount.com"
//! access_token_file = "~/.config/gcloud/token"
//! ```
//!
//! Secret ids only allow letters, digits, `_` and `-`; other keys fail
//! per key with the backend's error.

use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use super::command::{OneOrMany, Tool};
use super::Provider;
use crate::core::config::expand_home;
use crate::core::domain::{FolderRef, OrgRef, ResourceRef};
use crate::core::registry::ProviderConfig;
use crate::core::types::{FolderId, ResourceId};
use crate::error::{ProviderError, Result};

const ORGANIZATION_PREFIX: &str = "organizations/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationEntry {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectEntry {
    project_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parent: Option<ParentEntry>,
    #[serde(default)]
    lifecycle_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParentEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SecretEntry {
    name: String,
}

/// Google Cloud Secret Manager backend.
#[derive(Debug, Clone)]
pub struct Gcp {
    tool: Tool,
}

impl Gcp {
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut tool = Tool::new("gcloud").base_arg("--quiet");

        if let Some(account) = config.setting("account") {
            tool = tool.base_arg(format!("--account={}", account));
        }
        if let Some(token_file) = config.setting("access_token_file") {
            tool = tool.base_arg(format!(
                "--access-token-file={}",
                expand_home(token_file).display()
            ));
        }

        Self { tool }
    }

    fn projects(&self) -> Result<Vec<ProjectEntry>> {
        let projects: OneOrMany<ProjectEntry> =
            self.tool.run_json(&["projects", "list", "--format=json"])?;
        Ok(projects
            .into_vec()
            .into_iter()
            .filter(|p| p.lifecycle_state.as_deref().map_or(true, |s| s == "ACTIVE"))
            .collect())
    }
}

impl ProjectEntry {
    fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.id.as_str())
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.project_id)
    }
}

/// Split `projects/<project>/secrets/<secret>` into its parts.
fn split_secret(id: &str) -> Option<(&str, &str)> {
    let rest = id.strip_prefix("projects/")?;
    let (project, secret) = rest.split_once("/secrets/")?;
    if project.is_empty() || secret.is_empty() || secret.contains('/') {
        return None;
    }
    Some((project, secret))
}

fn secret_name(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

/// Derive a valid project id from a folder name: 6 to 30 characters of
/// lowercase letters, digits and hyphens, starting with a letter.
fn project_id_for(name: &str) -> String {
    let mut id = String::new();
    for ch in name.chars().map(|c| c.to_ascii_lowercase()) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            id.push(ch);
        } else if !id.is_empty() && !id.ends_with('-') {
            id.push('-');
        }
    }
    if !id.starts_with(|c: char| c.is_ascii_lowercase()) {
        id.insert_str(0, "nsm-");
    }
    id.truncate(30);
    while id.ends_with('-') {
        id.pop();
    }
    while id.len() < 6 {
        id.push_str("-nsm");
    }
    id
}

impl Provider for Gcp {
    fn name(&self) -> &'static str {
        "gcp"
    }

    fn list_organizations(&self) -> Result<Vec<OrgRef>> {
        let orgs: OneOrMany<OrganizationEntry> = self
            .tool
            .run_json(&["organizations", "list", "--format=json"])?;

        Ok(orgs
            .into_vec()
            .into_iter()
            .map(|o| {
                let id = o
                    .name
                    .strip_prefix(ORGANIZATION_PREFIX)
                    .unwrap_or(&o.name)
                    .to_string();
                OrgRef {
                    name: o.display_name.unwrap_or_else(|| id.clone()),
                    id,
                }
            })
            .collect())
    }

    fn list_projects(&self, root: Option<&str>) -> Result<Vec<FolderRef>> {
        Ok(self
            .projects()?
            .into_iter()
            .filter(|p| root.is_none() || p.parent_id() == root)
            .map(|p| FolderRef {
                id: p.project_id.clone(),
                name: p.display_name().to_string(),
                parent: p.parent_id().map(str::to_string),
            })
            .collect())
    }

    fn create_folder(&self, parent: Option<&str>, name: &str) -> Result<FolderId> {
        let parent = parent.map(|p| p.strip_prefix(ORGANIZATION_PREFIX).unwrap_or(p));

        if let Some(existing) = self.projects()?.into_iter().find(|p| {
            (p.display_name() == name || p.project_id == name) && p.parent_id() == parent
        }) {
            debug!(project = %existing.project_id, "project already exists");
            return Ok(existing.project_id);
        }

        let id = project_id_for(name);
        let display = format!("--name={}", name);
        let organization = parent.map(|p| format!("--organization={}", p));
        let mut args = vec!["projects", "create", id.as_str(), display.as_str()];
        if let Some(organization) = &organization {
            args.push(organization.as_str());
        }

        self.tool.run(&args)?;
        debug!(project = %id, "project created");
        Ok(id)
    }

    fn list_resources(&self, folder: &str) -> Result<Vec<ResourceRef>> {
        let secrets: OneOrMany<SecretEntry> = self.tool.run_json(&[
            "secrets",
            "list",
            "--format=json",
            "--project",
            folder,
        ])?;

        Ok(secrets
            .into_vec()
            .into_iter()
            .map(|s| ResourceRef {
                name: secret_name(&s.name).to_string(),
                id: s.name,
                folder: Some(folder.to_string()),
            })
            .collect())
    }

    fn create_resource(&self, folder: &str, name: &str, value: &[u8]) -> Result<ResourceId> {
        self.tool.run_with_input(
            &[
                "secrets",
                "create",
                name,
                "--project",
                folder,
                "--replication-policy=automatic",
                "--data-file=-",
            ],
            value,
        )?;
        Ok(format!("projects/{}/secrets/{}", folder, name))
    }

    fn update_resource(&self, id: &str, value: &[u8]) -> Result<()> {
        let (project, secret) = split_secret(id).ok_or_else(|| ProviderError::resource(id))?;
        self.tool.run_with_input(
            &[
                "secrets",
                "versions",
                "add",
                secret,
                "--project",
                project,
                "--data-file=-",
            ],
            value,
        )?;
        Ok(())
    }

    fn get_resource_value(&self, id: &str) -> Result<Zeroizing<Vec<u8>>> {
        let (project, secret) = split_secret(id).ok_or_else(|| ProviderError::resource(id))?;
        self.tool.run(&[
            "secrets",
            "versions",
            "access",
            "latest",
            "--secret",
            secret,
            "--project",
            project,
        ])
    }

    fn delete_resource(&self, id: &str) -> Result<()> {
        let (project, secret) = split_secret(id).ok_or_else(|| ProviderError::resource(id))?;
        self.tool
            .run(&["secrets", "delete", secret, "--project", project])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_entry_fields() {
        let projects: OneOrMany<ProjectEntry> = serde_json::from_str(
            r#"[{"projectId":"billing-api","name":"Billing API","projectNumber":"456",
                 "lifecycleState":"ACTIVE","parent":{"id":"123","type":"organization"}},
                {"projectId":"orphan"}]"#,
        )
        .unwrap();
        let projects = projects.into_vec();

        assert_eq!(projects[0].parent_id(), Some("123"));
        assert_eq!(projects[0].display_name(), "Billing API");
        assert_eq!(projects[1].parent_id(), None);
        assert_eq!(projects[1].display_name(), "orphan");
    }

    #[test]
    fn test_organization_entry_fields() {
        let orgs: OneOrMany<OrganizationEntry> = serde_json::from_str(
            r#"[{"name":"organizations/123","displayName":"example.com"}]"#,
        )
        .unwrap();
        let org = orgs.into_first().unwrap();

        assert_eq!(org.name.strip_prefix(ORGANIZATION_PREFIX), Some("123"));
        assert_eq!(org.display_name.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_secret_names() {
        let secrets: OneOrMany<SecretEntry> = serde_json::from_str(
            r#"[{"name":"projects/456/secrets/DB_URL","createTime":"2025-01-01T00:00:00Z",
                 "labels":{"team":"api"}}]"#,
        )
        .unwrap();
        let secret = secrets.into_first().unwrap();

        assert_eq!(secret_name(&secret.name), "DB_URL");
        assert_eq!(split_secret(&secret.name), Some(("456", "DB_URL")));
        assert_eq!(split_secret("DB_URL"), None);
        assert_eq!(split_secret("projects/456/secrets/"), None);
        assert_eq!(split_secret("projects/456/secrets/A/versions/1"), None);
    }

    #[test]
    fn test_project_id_for() {
        assert_eq!(project_id_for("Billing API"), "billing-api");
        assert_eq!(project_id_for("42 things"), "nsm-42-things");
        assert_eq!(project_id_for("app"), "app-nsm");
        assert_eq!(project_id_for(""), "nsm-nsm");

        let long = project_id_for("a very long project name that keeps going");
        assert!(long.len() <= 30);
        assert!(!long.ends_with('-'));
    }

    #[test]
    fn test_from_config_flags() {
        let config = ProviderConfig::new("gcp", crate::core::provider::ProviderKind::Gcp)
            .with_setting("account", "ci@example.com");

        let gcp = Gcp::from_config(&config);

        assert_eq!(gcp.tool.base_args(), ["--quiet", "--account=ci@example.com"]);
    }
}

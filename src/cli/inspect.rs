//! Read-only provider queries.

use tracing::debug;

use crate::cli::resolve::Session;
use crate::cli::{output, Context};
use crate::core::provider;
use crate::error::{ProviderError, Result};

/// List organizations.
pub fn organizations(ctx: &Context, json: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let orgs = session.provider.list_organizations()?;

    if json {
        output::data(&serde_json::to_string_pretty(&orgs)?);
    } else if orgs.is_empty() {
        output::dimmed("no organizations");
    } else {
        for org in &orgs {
            output::data(&org.to_string());
        }
    }
    Ok(())
}

/// List project folders under `root`, or under the provider's organization
/// root when not given.
pub fn projects(ctx: &Context, root: Option<&str>, json: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let root = root.or(session.config.organization_root_folder.as_deref());
    debug!(root = ?root, "listing projects");

    let mut projects = session.provider.list_projects(root)?;
    projects.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    if json {
        output::data(&serde_json::to_string_pretty(&projects)?);
    } else if projects.is_empty() {
        output::dimmed("no projects");
    } else {
        for project in &projects {
            match &project.parent {
                Some(parent) => output::data(&format!("{} (parent: {})", project, parent)),
                None => output::data(&project.to_string()),
            }
        }
    }
    Ok(())
}

/// List secrets in a folder without fetching their values.
pub fn secrets(ctx: &Context, folder: Option<&str>, json: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let folder = session.folder(folder)?;

    let mut resources = session.provider.list_resources(&folder)?;
    resources.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    if json {
        output::data(&serde_json::to_string_pretty(&resources)?);
    } else if resources.is_empty() {
        output::dimmed("no secrets");
    } else {
        for resource in &resources {
            output::data(&resource.to_string());
        }
    }
    Ok(())
}

/// Print one secret's value.
///
/// When several resources share the name, the smallest id wins, as in sync.
pub fn secret_value(ctx: &Context, name: &str, folder: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let folder = session.folder(folder)?;

    let resource = session
        .provider
        .list_resources(&folder)?
        .into_iter()
        .filter(|r| r.name == name)
        .min_by(|a, b| a.id.cmp(&b.id))
        .ok_or_else(|| ProviderError::NotFound {
            what: "secret",
            id: name.to_string(),
        })?;

    let bytes = session.provider.get_resource_value(&resource.id)?;
    let value = provider::value_to_string(&resource.id, &bytes)?;
    output::data(&value);
    Ok(())
}

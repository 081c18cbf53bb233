//! Provider commands.
//!
//! Register, select, list and remove providers.

use std::path::PathBuf;

use tracing::info;

use crate::cli::{output, Context};
use crate::core::config::{expand_home, Paths};
use crate::core::provider::ProviderKind;
use crate::core::registry::{AddOutcome, ProviderConfig, Registry};
use crate::error::{ConfigError, Result};

/// Arguments of `provider add`.
#[derive(Debug, Default)]
pub struct AddArgs {
    pub name: String,
    pub kind: String,
    pub server: Option<String>,
    pub private_key_file: Option<String>,
    pub passphrase_env: Option<String>,
    pub access_token_env: Option<String>,
    pub path: Option<PathBuf>,
    pub root_folder: Option<String>,
    pub settings: Vec<String>,
}

impl AddArgs {
    fn into_config(self) -> Result<ProviderConfig> {
        let kind: ProviderKind = self.kind.parse()?;
        let mut config = ProviderConfig::new(self.name, kind);

        for setting in &self.settings {
            let (key, value) = setting
                .split_once('=')
                .filter(|(k, _)| !k.trim().is_empty())
                .ok_or_else(|| ConfigError::InvalidSetting(setting.clone()))?;
            config
                .connection
                .insert(key.trim().to_string(), value.to_string());
        }

        let named = [
            ("server", self.server),
            ("private_key_file", self.private_key_file),
            ("passphrase_env", self.passphrase_env),
            ("access_token_env", self.access_token_env),
        ];
        for (key, value) in named {
            if let Some(value) = value {
                config.connection.insert(key.to_string(), value);
            }
        }
        if let Some(path) = self.path {
            let path = expand_home(&path.to_string_lossy());
            let path = std::path::absolute(&path).unwrap_or(path);
            config
                .connection
                .insert("path".to_string(), path.display().to_string());
        }
        config.organization_root_folder = self.root_folder;

        Ok(config)
    }
}

fn registry() -> Result<Registry> {
    Ok(Registry::open(&Paths::resolve()?))
}

/// Register a provider.
pub fn add(args: AddArgs) -> Result<()> {
    let config = args.into_config()?;
    let name = config.name.clone();
    let kind = config.kind;

    if kind == ProviderKind::Local && config.setting("path").is_none() {
        return Err(ConfigError::MissingConnection {
            provider: name,
            field: "path",
        }
        .into());
    }

    match registry()?.add(config)? {
        AddOutcome::Added => output::success(&format!("added {} ({})", output::key(&name), kind)),
        AddOutcome::Replaced => {
            output::warn(&format!("replaced existing provider {}", output::key(&name)))
        }
    }
    output::hint(&format!("run: nsm provider use {}", name));
    Ok(())
}

/// Select the active provider.
pub fn use_provider(name: &str) -> Result<()> {
    registry()?.use_provider(name)?;
    output::success(&format!("using {}", output::key(name)));
    Ok(())
}

/// Unregister a provider.
pub fn remove(name: &str, force: bool) -> Result<()> {
    let registry = registry()?;
    let was_active = registry.active_name()?.as_deref() == Some(name);

    registry.remove(name, force)?;

    output::success(&format!("removed {}", output::key(name)));
    if was_active {
        output::warn("no active provider");
        output::hint("run: nsm provider use <name>");
    }
    Ok(())
}

/// List registered providers.
pub fn list(json: bool) -> Result<()> {
    let registry = registry()?;
    let providers = registry.list()?;
    let active = registry.active_name()?;

    if json {
        let providers_json: Vec<_> = providers
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "kind": p.kind,
                    "active": active.as_deref() == Some(p.name.as_str()),
                    "connection": p.connection,
                    "organization_root_folder": p.organization_root_folder,
                    "added": p.added,
                })
            })
            .collect();
        let result = serde_json::json!({
            "providers": providers_json,
            "active": active,
            "count": providers.len(),
        });
        output::data(&serde_json::to_string_pretty(&result)?);
    } else if providers.is_empty() {
        output::dimmed("no providers registered");
        output::hint("run: nsm provider add <name> <kind>");
    } else {
        output::blank();
        output::header(&format!("{} providers", output::count(providers.len())));
        output::rule();
        for provider in &providers {
            let marker = if active.as_deref() == Some(provider.name.as_str()) {
                "*"
            } else {
                " "
            };
            output::data(&format!(
                "{} {}  {}",
                marker,
                output::key(&provider.name),
                provider.kind
            ));
            for (field, value) in &provider.connection {
                output::kv(field, value);
            }
        }
    }

    info!(count = providers.len(), "listed providers");
    Ok(())
}

/// Show the provider commands will use.
pub fn current(ctx: &Context) -> Result<()> {
    let registry = registry()?;
    let config = registry.resolve(ctx.provider.as_deref())?.redacted();

    output::header(&config.name);
    output::kv("kind:", config.kind);
    if let Some(root) = &config.organization_root_folder {
        output::kv("root folder:", root);
    }
    for (field, value) in &config.connection {
        output::kv(&format!("{}:", field), value);
    }
    if ctx.provider.is_some() {
        output::dimmed("(selected by --provider / NSM_PROVIDER)");
    }
    Ok(())
}

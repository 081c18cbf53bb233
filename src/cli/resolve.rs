//! Provider and project resolution helpers for CLI commands.

use std::path::PathBuf;

use tracing::debug;

use crate::cli::Context;
use crate::core::binding::{Bindings, ProjectBinding};
use crate::core::config::Paths;
use crate::core::constants;
use crate::core::provider::{self, Provider};
use crate::core::registry::{ProviderConfig, Registry};
use crate::core::types::FolderId;
use crate::error::Result;

/// An opened provider and the state it was resolved from.
pub struct Session {
    pub paths: Paths,
    pub config: ProviderConfig,
    pub provider: Box<dyn Provider>,
}

impl Session {
    /// Open the provider selected by `--provider` / `NSM_PROVIDER`, or the
    /// active one.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoActiveProvider` when nothing is selected,
    /// `ConfigError::ProviderNotFound` for an unknown override.
    pub fn open(ctx: &Context) -> Result<Self> {
        let paths = Paths::resolve()?;
        let config = Registry::open(&paths).resolve(ctx.provider.as_deref())?;
        let provider = provider::open(&config)?;
        debug!(provider = %config.name, kind = %config.kind, "session opened");
        Ok(Self {
            paths,
            config,
            provider,
        })
    }

    pub fn bindings(&self) -> Bindings {
        Bindings::open(&self.paths)
    }

    /// Binding of the current directory on this provider.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoBinding` if the directory is not bound.
    pub fn binding(&self) -> Result<ProjectBinding> {
        self.bindings().require(&current_dir()?, &self.config.name)
    }

    /// An explicit folder, or the current project's folder.
    pub fn folder(&self, explicit: Option<&str>) -> Result<FolderId> {
        match explicit {
            Some(folder) => Ok(folder.to_string()),
            None => Ok(self.binding()?.folder_id),
        }
    }
}

/// The directory commands operate on.
pub fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}

/// The secret file to use, `.env` in the current directory by default.
pub fn secret_file(file: Option<PathBuf>) -> Result<PathBuf> {
    match file {
        Some(file) => Ok(file),
        None => Ok(current_dir()?.join(constants::ENV_FILE)),
    }
}

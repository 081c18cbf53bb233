//! State directory layout.
//!
//! Everything nsm persists lives under one directory: `$NSM_HOME` when set,
//! otherwise `~/.nsm`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Resolved locations of the persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Resolve the state directory from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoHomeDir` if neither `NSM_HOME` nor a home
    /// directory is available.
    pub fn resolve() -> Result<Self> {
        let root = match std::env::var_os(constants::HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(constants::HOME_DIR),
        };
        debug!(root = %root.display(), "state directory");
        Ok(Self { root })
    }

    /// Use an explicit state directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// State directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Provider registry file.
    pub fn registry(&self) -> PathBuf {
        self.root.join(constants::REGISTRY_FILE)
    }

    /// Project binding file.
    pub fn bindings(&self) -> PathBuf {
        self.root.join(constants::BINDINGS_FILE)
    }

    /// Lock file guarding writes to an arbitrary file.
    ///
    /// Secret files live in project directories, so their locks are kept
    /// here, named after a digest of the absolute path.
    pub fn lock_for(&self, target: &Path) -> PathBuf {
        let absolute = std::path::absolute(target).unwrap_or_else(|_| target.to_path_buf());
        let digest = Sha256::digest(absolute.to_string_lossy().as_bytes());
        let name: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
        self.root
            .join(constants::LOCK_DIR)
            .join(format!("{}.lock", name))
    }
}

/// Expand a leading `~` to the home directory.
///
/// Other paths, and `~user` forms, are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

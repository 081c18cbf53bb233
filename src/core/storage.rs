//! Locked, atomic file persistence.
//!
//! Writers take an exclusive advisory lock on a sidecar lock file, then
//! replace the target through a temporary file in the same directory so a
//! reader never observes a half-written file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::error::{ConfigError, Result, StateError};

/// Exclusive lock held until dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the lock at `path` is acquired, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `StateError::Lock` if the lock file cannot be created or locked.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_err = |source| StateError::Lock {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;

        trace!(path = %path.display(), "lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        trace!(path = %self.path.display(), "lock released");
    }
}

/// Lock file path used for a state file (`<file>.lock`).
pub fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}

/// Read a TOML state file, returning the default value when it is absent.
///
/// # Errors
///
/// Returns `ConfigError::ReadFile` or `ConfigError::Parse` if the file exists
/// but cannot be read or decoded.
pub fn read_toml<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        debug!(path = %path.display(), "state file absent, using defaults");
        return Ok(T::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let value = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(value)
}

/// Serialize `value` as TOML and replace `path` atomically.
///
/// The caller is expected to hold the file's lock.
pub fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = toml::to_string_pretty(value).map_err(ConfigError::Serialize)?;
    write_atomic(path, contents.as_bytes())
}

/// Replace `path` with `contents` via a temporary file and rename.
///
/// The file is created with mode 0600 on Unix.
///
/// # Errors
///
/// Returns `StateError::Write` if any step fails; the original file is left
/// untouched in that case.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let write_err = |source| StateError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600)).map_err(write_err)?;
    }

    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "file replaced");
    Ok(())
}

//! Error types.
//!
//! Each layer has its own error enum; [`Error`] wraps them so commands can
//! propagate with `?` and `main` can map the failure to an exit code.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// `2` marks a partial failure (some keys synced, some did not), `130`
    /// an interrupted run, `1` everything that aborted before execution.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Sync(SyncError::PartialFailure { .. }) => 2,
            Error::Sync(SyncError::Cancelled { .. }) => 130,
            _ => 1,
        }
    }

    /// Follow-up command to suggest to the user, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::Config(ConfigError::NoActiveProvider) => {
                Some("run: nsm provider add <name> <kind>, then nsm provider use <name>")
            }
            Error::Config(ConfigError::ProviderNotFound(_)) => Some("run: nsm provider list"),
            Error::Config(ConfigError::NoBinding { .. }) => {
                Some("run: nsm project create --name <name>")
            }
            Error::Config(ConfigError::ActiveProviderInUse(_)) => {
                Some("select another provider first, or pass --force")
            }
            Error::Provider(ProviderError::CommandNotFound(_)) => {
                Some("install the backend CLI and make sure it is on PATH")
            }
            _ => None,
        }
    }
}

/// Registry and binding errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("no active provider")]
    NoActiveProvider,

    #[error("provider '{0}' is active")]
    ActiveProviderInUse(String),

    #[error("invalid provider name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("unsupported provider kind: {0}")]
    UnsupportedKind(String),

    #[error("provider '{provider}' is missing connection setting '{field}'")]
    MissingConnection {
        provider: String,
        field: &'static str,
    },

    #[error("invalid connection setting '{0}': expected KEY=VALUE")]
    InvalidSetting(String),

    #[error("no project bound to {} on provider '{provider}'", path.display())]
    NoBinding { path: PathBuf, provider: String },

    #[error("unable to determine home directory")]
    NoHomeDir,

    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Local secret file errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },
}

/// Coarse classification of a backend failure.
///
/// Reports carry the kind rather than the full error so output stays free of
/// backend stack traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    NotFound,
    PermissionDenied,
    DecryptionFailed,
    NetworkUnavailable,
    Other,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderErrorKind::NotFound => "not found",
            ProviderErrorKind::PermissionDenied => "permission denied",
            ProviderErrorKind::DecryptionFailed => "decryption failed",
            ProviderErrorKind::NetworkUnavailable => "network unavailable",
            ProviderErrorKind::Other => "backend error",
        };
        f.write_str(s)
    }
}

/// Backend call errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("{0} CLI not found")]
    CommandNotFound(&'static str),

    #[error("unexpected response from {backend}: {reason}")]
    InvalidResponse {
        backend: &'static str,
        reason: String,
    },

    #[error("{0}")]
    Backend(String),
}

impl ProviderError {
    /// Classification used in sync reports.
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::NotFound { .. } => ProviderErrorKind::NotFound,
            ProviderError::PermissionDenied(_) => ProviderErrorKind::PermissionDenied,
            ProviderError::DecryptionFailed(_) => ProviderErrorKind::DecryptionFailed,
            ProviderError::NetworkUnavailable(_) => ProviderErrorKind::NetworkUnavailable,
            _ => ProviderErrorKind::Other,
        }
    }

    pub(crate) fn resource(id: impl Into<String>) -> Self {
        ProviderError::NotFound {
            what: "resource",
            id: id.into(),
        }
    }

    pub(crate) fn folder(id: impl Into<String>) -> Self {
        ProviderError::NotFound {
            what: "folder",
            id: id.into(),
        }
    }
}

/// Local storage failures. Never recoverable.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state in {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// Outcomes of a sync run that need operator attention.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{operation}: {failed} of {total} keys failed")]
    PartialFailure {
        operation: &'static str,
        failed: usize,
        total: usize,
    },

    #[error("{operation} interrupted after {completed} actions")]
    Cancelled {
        operation: &'static str,
        completed: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

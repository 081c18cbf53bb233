//! Constants used throughout nsm.
//!
//! Centralizes file names and environment variable names.

/// State directory relative to HOME (~/.nsm).
pub const HOME_DIR: &str = ".nsm";

/// Environment variable overriding the state directory.
pub const HOME_ENV: &str = "NSM_HOME";

/// Environment variable overriding the active provider for one invocation.
pub const PROVIDER_ENV: &str = "NSM_PROVIDER";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "NSM_LOG";

/// Provider registry file name.
pub const REGISTRY_FILE: &str = "providers.toml";

/// Project binding file name.
pub const BINDINGS_FILE: &str = "projects.toml";

/// Directory holding lock files for secret files outside the state directory.
pub const LOCK_DIR: &str = "locks";

/// Default secret file name.
pub const ENV_FILE: &str = ".env";

/// Connection field names that are never shown by `provider list`.
pub const REDACTED_FIELDS: &[&str] = &["passphrase", "password", "token", "secret"];

/// Placeholder for redacted connection values.
pub const REDACTED: &str = "********";

//! Type aliases for domain concepts.
//!
//! Identifiers handed out by a provider are opaque strings; the aliases only
//! make signatures say which one is expected.

/// A secret key name (e.g., DATABASE_URL, API_KEY).
pub type SecretKey = String;

/// Backend-native folder identifier.
pub type FolderId = String;

/// Backend-native resource identifier.
pub type ResourceId = String;

/// Name of a registered provider.
pub type ProviderName = String;

//! RemoteSecretSet type.
//!
//! The decrypted contents of a bound folder, keyed by resource name.

use std::collections::BTreeMap;

use serde::Serialize;
use zeroize::Zeroizing;

use crate::core::domain::SecretSet;
use crate::core::types::{ResourceId, SecretKey};
use crate::error::ParseError;

/// A remote secret with the resource holding it.
pub struct RemoteSecret {
    pub id: ResourceId,
    pub value: Zeroizing<String>,
}

/// A remote resource whose name cannot be used as a key in a secret file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedKey {
    pub resource_id: ResourceId,
    pub name: String,
    pub reason: &'static str,
}

/// Remote secrets in key order.
#[derive(Default)]
pub struct RemoteSecretSet {
    entries: BTreeMap<SecretKey, RemoteSecret>,
    rejected: Vec<RejectedKey>,
}

impl RemoteSecretSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a secret. An existing entry for the key is kept.
    pub fn insert(&mut self, key: SecretKey, id: ResourceId, value: Zeroizing<String>) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, RemoteSecret { id, value });
        true
    }

    /// Record a resource left out because of its name.
    pub fn reject(&mut self, resource_id: ResourceId, name: String, reason: &'static str) {
        self.rejected.push(RejectedKey {
            resource_id,
            name,
            reason,
        });
    }

    /// Resources left out, in listing order.
    pub fn rejected(&self) -> &[RejectedKey] {
        &self.rejected
    }

    /// Look up a secret by key.
    pub fn get(&self, key: &str) -> Option<&RemoteSecret> {
        self.entries.get(key)
    }

    /// Entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RemoteSecret)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain key/value view, sorted by key.
    ///
    /// # Errors
    ///
    /// `ParseError::InvalidKey` if an entry was inserted under a key that a
    /// secret file cannot hold.
    pub fn to_secret_set(&self) -> Result<SecretSet, ParseError> {
        SecretSet::from_pairs(
            self.entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.value.as_str())),
        )
    }
}

impl std::fmt::Debug for RemoteSecretSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, &v.id)))
            .finish()
    }
}

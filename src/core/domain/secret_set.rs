//! SecretSet type.
//!
//! An ordered `KEY=VALUE` mapping parsed from a local secret file.
//!
//! ## Keys
//!
//! A key is what `parse` can read back: non-empty, no `=`, no leading `#`,
//! no line breaks and no surrounding whitespace. [`validate_key`] checks
//! this, and every entry of a set satisfies it.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ParseError, Result};

/// Ordered key/value secrets with unique keys.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretSet {
    entries: Vec<(String, String)>,
}

impl SecretSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the contents of a secret file.
    ///
    /// Blank lines and lines starting with `#` are skipped. The value is
    /// everything after the first `=`; double-quoted values are unescaped and
    /// single-quoted values are stripped of their quotes. When a key repeats,
    /// the last value wins and keeps the first key's position.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MalformedLine` for a line without `=` or with an
    /// empty key.
    pub fn parse(contents: &str) -> std::result::Result<Self, ParseError> {
        let mut set = Self::new();

        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ParseError::MalformedLine {
                line: idx + 1,
                reason: "missing '=' separator".to_string(),
            })?;

            let key = key.trim();
            if let Err(reason) = validate_key(key) {
                return Err(ParseError::MalformedLine {
                    line: idx + 1,
                    reason: reason.to_string(),
                });
            }

            if set.insert(key, parse_value(value.trim()))?.is_some() {
                warn!(key = %key, line = idx + 1, "duplicate key, last value wins");
            }
        }

        Ok(set)
    }

    /// Read and parse a secret file from disk.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Unreadable` if the file cannot be read, or
    /// `ParseError::MalformedLine` if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading secret file");

        let contents = std::fs::read_to_string(path).map_err(|e| ParseError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let set = Self::parse(&contents)?;

        debug!(keys = set.len(), "secret file loaded");
        Ok(set)
    }

    /// Serialize to secret file format.
    pub fn serialize(&self) -> String {
        let mut output = String::new();

        for (key, value) in &self.entries {
            if needs_quotes(value) {
                output.push_str(&format!("{}=\"{}\"\n", key, escape_value(value)));
            } else {
                output.push_str(&format!("{}={}\n", key, value));
            }
        }

        output
    }

    /// Insert or replace a value, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidKey` for a key that would not survive a
    /// serialize/parse round trip.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> std::result::Result<Option<String>, ParseError> {
        let key = key.into();
        if let Err(reason) = validate_key(&key) {
            return Err(ParseError::InvalidKey { key, reason });
        }
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Ok(Some(std::mem::replace(existing, value))),
            None => {
                self.entries.push((key, value));
                Ok(None)
            }
        }
    }

    /// Build a set from pairs; later duplicates win.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidKey` for the first invalid key.
    pub fn from_pairs<K, V, I>(pairs: I) -> std::result::Result<Self, ParseError>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut set = Self::new();
        for (key, value) in pairs {
            set.insert(key, value)?;
        }
        Ok(set)
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Values stay out of debug output.
impl std::fmt::Debug for SecretSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretSet")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Check that `key` can be written to and read back from a secret file.
///
/// Returns the reason on failure.
pub fn validate_key(key: &str) -> std::result::Result<(), &'static str> {
    if key.is_empty() {
        Err("empty key")
    } else if key.contains(['\n', '\r']) {
        Err("key contains a line break")
    } else if key.trim() != key {
        Err("key has surrounding whitespace")
    } else if key.starts_with('#') {
        Err("key starts with '#'")
    } else if key.contains('=') {
        Err("key contains '='")
    } else {
        Ok(())
    }
}

fn parse_value(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return unescape_double_quoted(&raw[1..raw.len() - 1]);
    }

    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }

    raw.to_string()
}

fn unescape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.chars().any(|ch| ch.is_whitespace() || ch.is_control())
        || value.contains('#')
        || value.contains('=')
        || value.contains('"')
        || value.contains('\'')
        || value.contains('\\')
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }

    escaped
}

impl std::fmt::Display for SecretSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize())
    }
}

//! Test support utilities for nsm integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own project dir, home dir (holding the nsm state) and
/// local provider store. No process-global state is mutated; child
/// processes use `.current_dir()` and explicit env vars, so tests can run in
/// parallel.
pub struct Test {
    /// Temporary directory for the test project
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
    /// Directory backing the `local` provider
    pub store: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        let store = TempDir::new().expect("failed to create temp store");

        Self { dir, home, store }
    }

    /// Create a test environment with an active local provider.
    pub fn with_provider(name: &str) -> Self {
        let t = Self::new();
        assert_success(&t.provider_add_local(name));
        assert_success(&t.provider_use(name));
        t
    }

    /// Create a test environment whose project dir is bound to a folder.
    pub fn with_project(folder: &str) -> Self {
        let t = Self::with_provider("offline");
        assert_success(&t.project_create(folder));
        t
    }

    /// State directory used by the binary.
    pub fn state_dir(&self) -> PathBuf {
        self.home.path().join(".nsm")
    }

    /// Path of a file inside the project dir.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write the project's `.env`.
    pub fn write_env(&self, contents: &str) {
        std::fs::write(self.path(".env"), contents).expect("failed to write .env");
    }

    /// Read the project's `.env`.
    pub fn read_env(&self) -> String {
        std::fs::read_to_string(self.path(".env")).expect("failed to read .env")
    }

    /// Replace the current value of the stored resource `name` with bytes
    /// that are not UTF-8, so reading it back fails.
    pub fn corrupt_stored_value(&self, name: &str) {
        let path = self.store.path().join("store.json");
        let raw = std::fs::read_to_string(&path).expect("failed to read store");
        let mut state: serde_json::Value = serde_json::from_str(&raw).expect("invalid store");

        let resource = state["resources"]
            .as_object_mut()
            .expect("store has no resources")
            .values_mut()
            .find(|r| r["name"] == name)
            .unwrap_or_else(|| panic!("no stored resource named {}", name));
        let versions = resource["versions"].as_array_mut().expect("no versions");
        *versions.last_mut().expect("empty versions") = serde_json::json!([255, 254]);

        let raw = serde_json::to_string(&state).unwrap();
        std::fs::write(&path, raw).expect("failed to write store");
    }
}

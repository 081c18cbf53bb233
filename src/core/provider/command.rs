//! Shared plumbing for adapters that drive a backend CLI.
//!
//! Runs the tool, captures its output and maps failures to
//! [`ProviderError`] kinds by inspecting stderr.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::trace;
use zeroize::Zeroizing;

use crate::error::{ProviderError, Result};

/// A backend CLI invocation template.
#[derive(Clone)]
pub(super) struct Tool {
    program: &'static str,
    args: Vec<String>,
    envs: Vec<(String, Zeroizing<String>)>,
}

impl Tool {
    pub(super) fn new(program: &'static str) -> Self {
        Self {
            program,
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Arguments appended to every invocation (global flags).
    pub(super) fn base_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Environment variable set on every invocation.
    pub(super) fn env(mut self, key: impl Into<String>, value: Zeroizing<String>) -> Self {
        self.envs.push((key.into(), value));
        self
    }

    #[cfg(test)]
    pub(super) fn base_args(&self) -> &[String] {
        &self.args
    }

    #[cfg(test)]
    pub(super) fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Run with `args` and return stdout.
    ///
    /// The returned buffer is zeroized on drop since it may hold a secret.
    ///
    /// # Errors
    ///
    /// `ProviderError::CommandNotFound` if the program is not on PATH, or the
    /// classified failure if it exits non-zero.
    pub(super) fn run(&self, args: &[&str]) -> Result<Zeroizing<Vec<u8>>> {
        self.exec(args, None)
    }

    /// Run with `input` written to stdin.
    pub(super) fn run_with_input(
        &self,
        args: &[&str],
        input: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        self.exec(args, Some(input))
    }

    fn exec(&self, args: &[&str], input: Option<&[u8]>) -> Result<Zeroizing<Vec<u8>>> {
        let program = which::which(self.program)
            .map_err(|_| ProviderError::CommandNotFound(self.program))?;

        // only the subcommand is traced; arguments may carry secret values
        trace!(
            program = self.program,
            command = %args.iter().take(2).copied().collect::<Vec<_>>().join(" "),
            "running backend command"
        );

        let mut cmd = Command::new(program);
        cmd.args(args)
            .args(&self.args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.envs {
            cmd.env(key, value.as_str());
        }

        let spawn_err = |e: std::io::Error| {
            ProviderError::Backend(format!("failed to run {}: {}", self.program, e))
        };
        let mut child = cmd.spawn().map_err(spawn_err)?;
        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input).map_err(spawn_err)?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify(self.program, &stderr).into());
        }

        Ok(Zeroizing::new(output.stdout))
    }

    /// Run and decode stdout as JSON. Empty output decodes as `T::default()`.
    pub(super) fn run_json<T: DeserializeOwned + Default>(&self, args: &[&str]) -> Result<T> {
        let stdout = self.run(args)?;
        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        serde_json::from_slice(&stdout).map_err(|e| {
            ProviderError::InvalidResponse {
                backend: self.program,
                reason: e.to_string(),
            }
            .into()
        })
    }
}

// Arguments and environment may hold credentials.
impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

/// Map a CLI failure to an error kind from its stderr text.
pub(super) fn classify(program: &str, stderr: &str) -> ProviderError {
    let first_line = stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("command failed")
        .to_string();
    let lower = stderr.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["not found", "not_found", "404", "does not exist", "no such resource"]) {
        ProviderError::NotFound {
            what: "resource",
            id: first_line,
        }
    } else if has(&["permission", "forbidden", "403", "401", "unauthorized", "access denied"]) {
        ProviderError::PermissionDenied(first_line)
    } else if has(&["decrypt", "openpgp", "private key", "passphrase"]) {
        ProviderError::DecryptionFailed(first_line)
    } else if has(&[
        "connection refused",
        "no such host",
        "timeout",
        "timed out",
        "dial tcp",
        "network is unreachable",
        "dns",
    ]) {
        ProviderError::NetworkUnavailable(first_line)
    } else {
        ProviderError::Backend(format!("{}: {}", program, first_line))
    }
}

/// A JSON payload that is either one object or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub(super) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }

    pub(super) fn into_first(self) -> Option<T> {
        self.into_vec().into_iter().next()
    }
}

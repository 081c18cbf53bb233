//! Action plan types.
//!
//! A plan is computed before any mutating backend call and executed as a
//! separate step, so `--dry-run` and the real run share the same decisions.

use serde::Serialize;
use zeroize::Zeroizing;

use crate::core::domain::report::KeyFailure;
use crate::core::types::{ResourceId, SecretKey};

/// The sync operation a plan belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Restore,
    Clean,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Restore => "restore",
            Operation::Clean => "clean",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single decision for one key.
pub enum Action {
    /// No resource with this name exists remotely.
    Create {
        key: SecretKey,
        value: Zeroizing<String>,
    },
    /// The remote value differs from the local one.
    Update {
        key: SecretKey,
        id: ResourceId,
        value: Zeroizing<String>,
    },
    /// Local and remote agree.
    Noop { key: SecretKey },
    /// Remove the resource.
    Delete { key: SecretKey, id: ResourceId },
}

impl Action {
    /// Key the action applies to.
    pub fn key(&self) -> &str {
        match self {
            Action::Create { key, .. }
            | Action::Update { key, .. }
            | Action::Noop { key }
            | Action::Delete { key, .. } => key,
        }
    }

    /// Remote resource targeted, if it already exists.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Action::Update { id, .. } | Action::Delete { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Upper-case verb used in logs and dry-run output.
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Create { .. } => "CREATE",
            Action::Update { .. } => "UPDATE",
            Action::Noop { .. } => "NOOP",
            Action::Delete { .. } => "DELETE",
        }
    }

    /// Whether executing the action calls the backend.
    pub fn is_noop(&self) -> bool {
        matches!(self, Action::Noop { .. })
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.verb(), self.key())
    }
}

// Values stay out of debug output.
impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.resource_id() {
            Some(id) => write!(f, "{} {} ({})", self.verb(), self.key(), id),
            None => write!(f, "{} {}", self.verb(), self.key()),
        }
    }
}

/// Ordered actions for one operation.
#[derive(Debug)]
pub struct Plan {
    operation: Operation,
    actions: Vec<Action>,
    unresolved: Vec<KeyFailure>,
}

impl Plan {
    /// Build a plan; actions are ordered by key, then resource id.
    ///
    /// `unresolved` lists keys that could not be planned (for example a
    /// remote value that failed to decrypt); they are reported as failures.
    pub fn new(operation: Operation, mut actions: Vec<Action>, unresolved: Vec<KeyFailure>) -> Self {
        actions.sort_by(|a, b| {
            a.key()
                .cmp(b.key())
                .then_with(|| a.resource_id().cmp(&b.resource_id()))
        });
        Self {
            operation,
            actions,
            unresolved,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// All actions in execution order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Keys that failed during planning.
    pub fn unresolved(&self) -> &[KeyFailure] {
        &self.unresolved
    }

    /// Number of actions that call the backend.
    pub fn pending(&self) -> usize {
        self.actions.iter().filter(|a| !a.is_noop()).count()
    }

    /// Whether nothing needs to happen.
    pub fn is_noop(&self) -> bool {
        self.pending() == 0 && self.unresolved.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Operation, Vec<Action>, Vec<KeyFailure>) {
        (self.operation, self.actions, self.unresolved)
    }
}

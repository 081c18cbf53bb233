//! Sync report types.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::domain::plan::Operation;
use crate::core::domain::RejectedKey;
use crate::core::types::SecretKey;
use crate::error::{ProviderError, ProviderErrorKind, SyncError};

/// What happened to one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    Deleted,
    Failed {
        kind: ProviderErrorKind,
        message: String,
    },
    /// Not attempted because the run was cancelled.
    Skipped,
}

/// A key that failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyFailure {
    pub key: SecretKey,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl KeyFailure {
    pub fn new(key: impl Into<String>, err: &ProviderError) -> Self {
        Self {
            key: key.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Per-key result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyOutcome {
    pub key: SecretKey,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Terminal state of an executed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    PartialFailure,
    Cancelled,
}

/// Result of executing a plan.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    operation: Operation,
    status: ReportStatus,
    outcomes: Vec<KeyOutcome>,
}

impl SyncReport {
    /// Build a report from outcomes in execution order.
    pub fn new(operation: Operation, outcomes: Vec<KeyOutcome>, cancelled: bool) -> Self {
        let failed = outcomes
            .iter()
            .any(|o| matches!(o.outcome, Outcome::Failed { .. }));
        let status = if cancelled {
            ReportStatus::Cancelled
        } else if failed {
            ReportStatus::PartialFailure
        } else {
            ReportStatus::Success
        };
        Self {
            operation,
            status,
            outcomes,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn status(&self) -> ReportStatus {
        self.status
    }

    /// All outcomes in execution order.
    pub fn outcomes(&self) -> &[KeyOutcome] {
        &self.outcomes
    }

    /// Outcome recorded for a key (the first one, if it appears twice).
    pub fn outcome(&self, key: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.key == key)
            .map(|o| &o.outcome)
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unchanged))
    }

    pub fn deleted(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Deleted))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    /// Failed keys with their error kinds.
    pub fn failures(&self) -> Vec<KeyFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.outcome {
                Outcome::Failed { kind, message } => Some(KeyFailure {
                    key: o.key.clone(),
                    kind: *kind,
                    message: message.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Turn a non-successful status into an error for the exit code.
    pub fn check(&self) -> Result<(), SyncError> {
        match self.status {
            ReportStatus::Success => Ok(()),
            ReportStatus::PartialFailure => Err(SyncError::PartialFailure {
                operation: self.operation.as_str(),
                failed: self.failed(),
                total: self.outcomes.len(),
            }),
            ReportStatus::Cancelled => Err(SyncError::Cancelled {
                operation: self.operation.as_str(),
                completed: self.outcomes.len() - self.skipped(),
            }),
        }
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }
}

/// Result of a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub path: PathBuf,
    /// Keys written to the file.
    pub restored: usize,
    /// Remote resources left out because their names are not valid keys.
    pub skipped: Vec<RejectedKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(key: &str, outcome: Outcome) -> KeyOutcome {
        KeyOutcome {
            key: key.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_report_counts_and_status() {
        let report = SyncReport::new(
            Operation::Add,
            vec![
                outcome("A", Outcome::Created),
                outcome("B", Outcome::Updated),
                outcome("C", Outcome::Unchanged),
                outcome(
                    "D",
                    Outcome::Failed {
                        kind: ProviderErrorKind::PermissionDenied,
                        message: "permission denied: D".into(),
                    },
                ),
            ],
            false,
        );

        assert_eq!(report.created(), 1);
        assert_eq!(report.updated(), 1);
        assert_eq!(report.unchanged(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.status(), ReportStatus::PartialFailure);
        assert_eq!(report.failures()[0].key, "D");
        assert!(matches!(
            report.check(),
            Err(SyncError::PartialFailure {
                failed: 1,
                total: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_cancelled_takes_precedence() {
        let report = SyncReport::new(
            Operation::Clean,
            vec![outcome("A", Outcome::Deleted), outcome("B", Outcome::Skipped)],
            true,
        );

        assert_eq!(report.status(), ReportStatus::Cancelled);
        assert!(matches!(
            report.check(),
            Err(SyncError::Cancelled { completed: 1, .. })
        ));
    }

    #[test]
    fn test_report_json_shape() {
        let report = SyncReport::new(Operation::Add, vec![outcome("A", Outcome::Created)], false);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["operation"], "add");
        assert_eq!(json["status"], "success");
        assert_eq!(json["outcomes"][0]["key"], "A");
        assert_eq!(json["outcomes"][0]["status"], "created");
    }
}

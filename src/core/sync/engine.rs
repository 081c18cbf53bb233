//! Sync engine.
//!
//! Each operation runs in three steps: PLAN reads the local file and the
//! bound folder without mutating anything, EXECUTE applies the actions one
//! backend call at a time, REPORT aggregates the per-key outcomes. A failing
//! key never stops the others.

use std::path::Path;

use tracing::{debug, info, warn};

use super::CancelToken;
use crate::core::binding::ProjectBinding;
use crate::core::config::Paths;
use crate::core::domain::{
    validate_key, Action, KeyFailure, KeyOutcome, Operation, Outcome, Plan, RemoteSecretSet,
    ResourceRef, RestoreReport, SecretSet, SyncReport,
};
use crate::core::provider::{self, Provider};
use crate::core::storage::{self, FileLock};
use crate::core::types::FolderId;
use crate::error::{Error, ProviderErrorKind, Result, SyncError};

/// Synchronizes one local secret file with one bound folder.
pub struct Engine<'a> {
    provider: &'a dyn Provider,
    folder: FolderId,
    paths: Paths,
    cancel: CancelToken,
}

impl<'a> Engine<'a> {
    pub fn new(provider: &'a dyn Provider, binding: &ProjectBinding, paths: &Paths) -> Self {
        Self {
            provider,
            folder: binding.folder_id.clone(),
            paths: paths.clone(),
            cancel: CancelToken::new(),
        }
    }

    /// Observe `token` between backend calls.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// The bound folder.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Fetch every secret in the bound folder.
    ///
    /// When several resources share a name, the one with the smallest id is
    /// used. Resources whose name is not a valid key are not fetched and are
    /// listed in [`RemoteSecretSet::rejected`].
    ///
    /// # Errors
    ///
    /// Any provider error; restore cannot produce a partial file.
    pub fn remote_set(&self, operation: Operation) -> Result<RemoteSecretSet> {
        let mut remote = RemoteSecretSet::new();

        for (fetched, resource) in self.canonical_resources()?.into_iter().enumerate() {
            if let Err(reason) = validate_key(&resource.name) {
                warn!(
                    resource = %resource.id,
                    name = ?resource.name,
                    reason,
                    "resource name is not a usable key, skipped"
                );
                remote.reject(resource.id, resource.name, reason);
                continue;
            }
            self.check_cancelled(operation, fetched)?;
            let bytes = self.provider.get_resource_value(&resource.id)?;
            let value = provider::value_to_string(&resource.id, &bytes)?;
            remote.insert(resource.name, resource.id, value);
        }

        debug!(folder = %self.folder, keys = remote.len(), "remote secrets fetched");
        Ok(remote)
    }

    /// Decide what `add` would do for `local`.
    ///
    /// # Errors
    ///
    /// Fails if the folder cannot be listed. A value that cannot be read is
    /// recorded as a failure for that key instead.
    pub fn plan_add(&self, local: &SecretSet) -> Result<Plan> {
        let remote = self.canonical_resources()?;
        let mut actions = Vec::with_capacity(local.len());
        let mut unresolved = Vec::new();

        for (planned, (key, value)) in local.iter().enumerate() {
            self.check_cancelled(Operation::Add, planned)?;

            let existing = remote
                .binary_search_by(|r| r.name.as_str().cmp(key))
                .ok()
                .map(|i| &remote[i]);

            let Some(resource) = existing else {
                actions.push(Action::Create {
                    key: key.to_string(),
                    value: value.to_string().into(),
                });
                continue;
            };

            let current = self
                .provider
                .get_resource_value(&resource.id)
                .and_then(|bytes| provider::value_to_string(&resource.id, &bytes));

            match current {
                Ok(current) if current.as_str() == value => {
                    actions.push(Action::Noop {
                        key: key.to_string(),
                    });
                }
                Ok(_) => actions.push(Action::Update {
                    key: key.to_string(),
                    id: resource.id.clone(),
                    value: value.to_string().into(),
                }),
                Err(e) => {
                    warn!(key = %key, error = %e, "cannot read remote value");
                    unresolved.push(key_failure(key, &e));
                }
            }
        }

        let plan = Plan::new(Operation::Add, actions, unresolved);
        debug!(pending = plan.pending(), "add planned");
        Ok(plan)
    }

    /// Push the secrets in `path` to the bound folder.
    ///
    /// # Errors
    ///
    /// `ParseError` for an unreadable or malformed file, or any error from
    /// [`plan_add`](Self::plan_add). Per-key failures land in the report.
    pub fn add(&self, path: &Path) -> Result<SyncReport> {
        let local = SecretSet::load(path)?;
        let plan = self.plan_add(&local)?;
        Ok(self.execute(plan))
    }

    /// Overwrite `path` with the bound folder's secrets, sorted by key.
    ///
    /// The file is replaced atomically while holding its lock. Resources
    /// whose names cannot be written as keys are left out and listed in the
    /// report.
    pub fn restore(&self, path: &Path) -> Result<RestoreReport> {
        let remote = self.remote_set(Operation::Restore)?;
        let secrets = remote.to_secret_set()?;

        let _lock = FileLock::acquire(&self.paths.lock_for(path))?;
        storage::write_atomic(path, secrets.serialize().as_bytes())?;

        info!(
            path = %path.display(),
            keys = secrets.len(),
            skipped = remote.rejected().len(),
            "secrets restored"
        );
        Ok(RestoreReport {
            path: path.to_path_buf(),
            restored: secrets.len(),
            skipped: remote.rejected().to_vec(),
        })
    }

    /// One delete per resource in the bound folder, duplicates included.
    pub fn plan_clean(&self) -> Result<Plan> {
        let actions = self
            .provider
            .list_resources(&self.folder)?
            .into_iter()
            .map(|r| Action::Delete {
                key: r.name,
                id: r.id,
            })
            .collect();
        Ok(Plan::new(Operation::Clean, actions, Vec::new()))
    }

    /// Delete every resource in the bound folder.
    pub fn clean(&self) -> Result<SyncReport> {
        let plan = self.plan_clean()?;
        Ok(self.execute(plan))
    }

    /// Apply a plan and report every key.
    ///
    /// Once cancellation is observed no further backend calls are issued and
    /// the remaining actions are reported as skipped.
    pub fn execute(&self, plan: Plan) -> SyncReport {
        let (operation, actions, unresolved) = plan.into_parts();
        let mut outcomes = Vec::with_capacity(actions.len() + unresolved.len());
        let mut cancelled = false;

        for action in &actions {
            if !cancelled && !action.is_noop() && self.cancel.is_cancelled() {
                warn!(operation = %operation, "cancelled, skipping remaining actions");
                cancelled = true;
            }

            let outcome = match action {
                Action::Noop { .. } => Outcome::Unchanged,
                _ if cancelled => Outcome::Skipped,
                _ => self.apply(action),
            };
            outcomes.push(KeyOutcome {
                key: action.key().to_string(),
                outcome,
            });
        }

        outcomes.extend(unresolved.into_iter().map(|f| KeyOutcome {
            key: f.key,
            outcome: Outcome::Failed {
                kind: f.kind,
                message: f.message,
            },
        }));
        outcomes.sort_by(|a, b| a.key.cmp(&b.key));

        let report = SyncReport::new(operation, outcomes, cancelled);
        info!(
            operation = %operation,
            created = report.created(),
            updated = report.updated(),
            deleted = report.deleted(),
            failed = report.failed(),
            "sync finished"
        );
        report
    }

    fn apply(&self, action: &Action) -> Outcome {
        let result = match action {
            Action::Create { key, value } => self
                .provider
                .create_resource(&self.folder, key, value.as_bytes())
                .map(|id| {
                    debug!(key = %key, resource = %id, "created");
                    Outcome::Created
                }),
            Action::Update { id, value, .. } => self
                .provider
                .update_resource(id, value.as_bytes())
                .map(|()| Outcome::Updated),
            Action::Delete { id, .. } => self
                .provider
                .delete_resource(id)
                .map(|()| Outcome::Deleted),
            Action::Noop { .. } => Ok(Outcome::Unchanged),
        };

        result.unwrap_or_else(|e| {
            warn!(action = %action, error = %e, "action failed");
            let failure = key_failure(action.key(), &e);
            Outcome::Failed {
                kind: failure.kind,
                message: failure.message,
            }
        })
    }

    /// Resources sorted by name, one per name (smallest id).
    fn canonical_resources(&self) -> Result<Vec<ResourceRef>> {
        let mut resources = self.provider.list_resources(&self.folder)?;
        resources.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        resources.dedup_by(|dup, kept| {
            let same = dup.name == kept.name;
            if same {
                warn!(key = %kept.name, kept = %kept.id, ignored = %dup.id, "duplicate remote resource");
            }
            same
        });
        Ok(resources)
    }

    fn check_cancelled(&self, operation: Operation, completed: usize) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled {
                operation: operation.as_str(),
                completed,
            }
            .into());
        }
        Ok(())
    }
}

fn key_failure(key: &str, err: &Error) -> KeyFailure {
    match err {
        Error::Provider(e) => KeyFailure::new(key, e),
        other => KeyFailure {
            key: key.to_string(),
            kind: ProviderErrorKind::Other,
            message: other.to_string(),
        },
    }
}

//! Domain types.

pub mod plan;
mod refs;
mod remote;
pub mod report;
mod secret_set;

pub use plan::{Action, Operation, Plan};
pub use refs::{FolderRef, OrgRef, ResourceRef};
pub use remote::{RejectedKey, RemoteSecret, RemoteSecretSet};
pub use report::{KeyFailure, KeyOutcome, Outcome, ReportStatus, RestoreReport, SyncReport};
pub use secret_set::{validate_key, SecretSet};

//! nsm - sync project secrets with remote secret providers.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── provider      # Provider registry commands
//! │   ├── project       # Project binding and secret sync commands
//! │   ├── inspect       # Read-only provider queries
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── provider/     # Provider trait and backend adapters
//!     ├── registry      # providers.toml management
//!     ├── binding       # projects.toml management
//!     ├── domain/       # Secret sets, plans, reports
//!     ├── sync/         # Plan, execute, report
//!     ├── storage       # Locked atomic writes
//!     └── config        # State directory layout
//! ```
//!
//! # Features
//!
//! - Passbolt, Bitwarden Secrets Manager and local directory backends
//! - Idempotent add, restore and clean of `.env` files
//! - Per-key reporting with partial-failure exit codes
//! - Dry runs and JSON reports

pub mod cli;
pub mod core;
pub mod error;

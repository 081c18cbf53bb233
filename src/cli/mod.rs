//! Command-line interface.

pub mod completions;
pub mod inspect;
pub mod output;
pub mod project;
pub mod provider;
pub mod resolve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::constants;
use crate::core::sync::CancelToken;
use crate::error::Result;

/// nsm - sync project secrets with remote secret providers.
#[derive(Parser)]
#[command(
    name = "nsm",
    about = "Sync project .env secrets with remote secret providers",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this provider instead of the active one
    #[arg(long, global = true, env = constants::PROVIDER_ENV)]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Manage registered providers
    Provider {
        #[command(subcommand)]
        action: ProviderAction,
    },

    /// Bind the current directory to a remote folder and sync its secrets
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// List organizations visible to the provider
    Organizations {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List project folders
    Projects {
        /// Parent folder (defaults to the provider's organization root)
        #[arg(long)]
        root: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List secrets in a folder
    Secrets {
        /// Folder id (defaults to the current project's folder)
        #[arg(long)]
        folder: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the value of one secret
    SecretValue {
        /// Secret key
        name: String,
        /// Folder id (defaults to the current project's folder)
        #[arg(long)]
        folder: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Provider subcommands.
#[derive(Subcommand)]
pub enum ProviderAction {
    /// List registered providers
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register a provider (replaces one with the same name)
    Add {
        /// Provider name
        name: String,
        /// Backend kind: passbolt, bitwarden, gcp, local
        kind: String,
        /// Server URL
        #[arg(long)]
        server: Option<String>,
        /// Path to the private key file (passbolt)
        #[arg(long)]
        private_key_file: Option<String>,
        /// Environment variable holding the key passphrase (passbolt)
        #[arg(long)]
        passphrase_env: Option<String>,
        /// Environment variable holding the access token (bitwarden)
        #[arg(long)]
        access_token_env: Option<String>,
        /// Store directory (local)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Folder under which projects are created
        #[arg(long)]
        root_folder: Option<String>,
        /// Extra connection setting
        #[arg(long = "set", value_name = "KEY=VALUE")]
        settings: Vec<String>,
    },

    /// Select the active provider
    Use {
        /// Provider name
        name: String,
    },

    /// Unregister a provider
    Remove {
        /// Provider name
        name: String,
        /// Allow removing the active provider
        #[arg(short, long)]
        force: bool,
    },

    /// Show the active provider
    Current,
}

/// Project subcommands.
#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create (or reuse) a remote folder and bind it to the current directory
    Create {
        /// Folder name
        #[arg(short, long)]
        name: String,
        /// Parent folder id (defaults to the provider's organization root)
        #[arg(long)]
        folder: Option<String>,
    },

    /// Show the binding of the current directory
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget the binding of the current directory (remote data is kept)
    Remove,

    /// Sync the project's secret file
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

/// Secret sync subcommands.
#[derive(Subcommand)]
pub enum SecretAction {
    /// Push local secrets to the bound folder
    Add {
        /// Secret file (default: .env)
        file: Option<PathBuf>,
        /// Print the plan without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Overwrite the local secret file with the bound folder's secrets
    Restore {
        /// Secret file (default: .env)
        file: Option<PathBuf>,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every secret in the bound folder
    Clean {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Print the plan without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Provider override from `--provider` / `NSM_PROVIDER`.
    pub provider: Option<String>,
    /// Set by the interrupt handler.
    pub cancel: CancelToken,
}

/// Execute a command.
pub fn execute(command: Command, ctx: &Context) -> Result<()> {
    use Command::*;

    match command {
        Provider { action } => match action {
            ProviderAction::List { json } => provider::list(json),
            ProviderAction::Add {
                name,
                kind,
                server,
                private_key_file,
                passphrase_env,
                access_token_env,
                path,
                root_folder,
                settings,
            } => provider::add(provider::AddArgs {
                name,
                kind,
                server,
                private_key_file,
                passphrase_env,
                access_token_env,
                path,
                root_folder,
                settings,
            }),
            ProviderAction::Use { name } => provider::use_provider(&name),
            ProviderAction::Remove { name, force } => provider::remove(&name, force),
            ProviderAction::Current => provider::current(ctx),
        },
        Project { action } => match action {
            ProjectAction::Create { name, folder } => project::create(ctx, &name, folder.as_deref()),
            ProjectAction::Show { json } => project::show(ctx, json),
            ProjectAction::Remove => project::remove(ctx),
            ProjectAction::Secret { action } => match action {
                SecretAction::Add {
                    file,
                    dry_run,
                    json,
                } => project::add(ctx, file, dry_run, json),
                SecretAction::Restore { file, json } => project::restore(ctx, file, json),
                SecretAction::Clean { yes, dry_run, json } => {
                    project::clean(ctx, yes, dry_run, json)
                }
            },
        },
        Organizations { json } => inspect::organizations(ctx, json),
        Projects { root, json } => inspect::projects(ctx, root.as_deref(), json),
        Secrets { folder, json } => inspect::secrets(ctx, folder.as_deref(), json),
        SecretValue { name, folder } => inspect::secret_value(ctx, &name, folder.as_deref()),
        Completions { shell } => completions::execute(shell),
    }
}

//! nsm - sync project secrets with remote secret providers.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nsm::cli::output;
use nsm::cli::{execute, Cli, Context};
use nsm::core::constants;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("nsm=debug")
        } else {
            EnvFilter::new("nsm=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .init();

    let ctx = Context {
        provider: cli.provider,
        ..Context::default()
    };

    // the first Ctrl-C lets the running action finish and skips the rest
    let token = ctx.cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
        tracing::debug!(error = %e, "interrupt handler not installed");
    }

    if let Err(e) = execute(cli.command, &ctx) {
        output::error(&e.to_string());
        if let Some(hint) = e.hint() {
            output::hint(hint);
        }
        std::process::exit(e.exit_code());
    }
}

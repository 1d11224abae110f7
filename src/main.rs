//! credsweep CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use credsweep::cli::{Cli, Commands};
use credsweep::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(if cli.verbose { "credsweep=debug" } else { "credsweep=warn" })
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Route to command handler
    match cli.command {
        Commands::Scan { paths, no_browser, no_git, no_env, format } => {
            commands::scan::run(paths, no_browser, no_git, no_env, format, cli.verbose)
        }

        Commands::Findings { format } => {
            commands::findings::run(format, cli.verbose)
        }

        Commands::Status => {
            commands::status::run()
        }
    }
}

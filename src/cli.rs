//! CLI argument parsing for credsweep.
//!
//! Uses clap derive macros for type-safe argument handling.

use clap::{Parser, Subcommand};

/// credsweep: discover exposed credentials, score risk, store findings encrypted.
#[derive(Parser)]
#[command(
    name = "credsweep",
    about = "On-host credential hygiene agent — secret discovery, risk scoring, encrypted storage",
    version,
    author,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full scan: collectors → detection → encrypted persistence.
    Scan {
        /// Extra directories to scan, in addition to the configured paths.
        #[arg(long = "path")]
        paths: Vec<String>,

        /// Skip the browser password collector.
        #[arg(long)]
        no_browser: bool,

        /// Skip the git working-tree and history collectors.
        #[arg(long)]
        no_git: bool,

        /// Skip the well-known config-file collector.
        #[arg(long)]
        no_env: bool,

        /// Output format: pretty, json.
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// List stored findings, highest risk first.
    Findings {
        /// Output format: pretty, json.
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Show agent status: database path, row count, last scan.
    Status,
}

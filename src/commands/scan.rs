//! Scan command: run the full pipeline and report the summary.

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::commands::{load_config, open_database};
use crate::core::service::ScanService;

pub fn run(
    paths: Vec<String>,
    no_browser: bool,
    no_git: bool,
    no_env: bool,
    format: String,
    verbose: bool,
) -> Result<()> {
    let mut config = load_config()?;

    for path in paths {
        config.scan_paths.push(PathBuf::from(path));
    }
    if no_browser {
        config.include_browser_scans = false;
    }
    if no_git {
        config.include_git_scans = false;
    }
    if no_env {
        config.include_env_scans = false;
    }

    if verbose {
        println!("{}", "Running scan in verbose mode".dimmed());
        for path in &config.scan_paths {
            println!("  Scan path: {}", path.display());
        }
    }

    let db = open_database(&config)?;
    let service = ScanService::new(db, config);

    println!(
        "\n{}",
        "┌─ Scanning for exposed credentials ──────────────────┐".cyan()
    );
    println!(
        "{}",
        "│ Browsers, files, git repos, cloud-tooling configs   │".cyan()
    );
    println!(
        "{}\n",
        "└──────────────────────────────────────────────────────┘".cyan()
    );

    let summary = service.run_full_scan()?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => {
            if summary.findings_count == 0 {
                println!("{} No credentials at risk", "✓".green());
            } else {
                println!(
                    "{} Recorded {} findings in {:.1}s",
                    "✗".red(),
                    summary.findings_count,
                    summary.duration_seconds
                );
                println!(
                    "\n  {}",
                    "Run `credsweep findings` to review them.".yellow()
                );
            }
        }
    }

    Ok(())
}

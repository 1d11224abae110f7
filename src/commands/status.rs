//! Status command: database location, row count, last scan.

use anyhow::Result;
use colored::*;

use crate::commands::{load_config, open_database};

pub fn run() -> Result<()> {
    let config = load_config()?;
    let db = open_database(&config)?;

    println!("{} agent store is reachable", "✓".green());
    println!("  Database: {}", db.path().display());
    println!("  Findings: {}", db.findings_count()?);

    match db.latest_scan()? {
        Some(scan) => {
            println!(
                "  Last scan: {} ({}, {} findings)",
                scan.started_at, scan.status, scan.num_findings
            );
        }
        None => println!("  Last scan: never"),
    }

    Ok(())
}

//! Findings command: list stored findings, highest risk first.

use anyhow::Result;
use colored::*;

use crate::commands::{load_config, open_database};

pub fn run(format: String, verbose: bool) -> Result<()> {
    let config = load_config()?;
    let db = open_database(&config)?;
    let findings = db.list_all()?;

    if verbose {
        println!("{}", format!("{} rows in store", findings.len()).dimmed());
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&findings)?);
        return Ok(());
    }

    if findings.is_empty() {
        println!("{} No findings recorded", "✓".green());
        return Ok(());
    }

    println!("{}", "Findings (highest risk first):".bold());
    for finding in &findings {
        let badge = if finding.risk_score > 80 {
            format!("{:>3}", finding.risk_score).red().bold()
        } else if finding.risk_score > 40 {
            format!("{:>3}", finding.risk_score).yellow()
        } else {
            format!("{:>3}", finding.risk_score).normal()
        };

        println!(
            "  [{}] {} {}",
            badge,
            finding.source_type.bold(),
            finding.preview.dimmed()
        );
        if let Some(domain) = &finding.domain {
            println!("       Domain: {domain}");
        }
        if !finding.issue_flags.is_empty() {
            println!("       Issues: {}", finding.issue_flags.join(", "));
        }
        if let Some(explanation) = &finding.ai_explanation {
            println!("       {}", explanation.italic());
        }
    }

    Ok(())
}

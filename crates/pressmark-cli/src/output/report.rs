//! Scan report rendering.

use colored::Colorize;
use pressmark::scan::{PageHints, ProbeEvent};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// One fingerprinted component in the report
#[derive(Debug, Clone, Serialize)]
pub struct ReportComponent {
    /// Group the component belongs to (`core`, `plugins`, `themes`)
    pub group: String,

    /// Component key
    pub key: String,

    /// Decided version, or `unknown`
    pub version: String,

    /// Number of files that contributed matching evidence
    pub evidence_count: usize,
}

/// The complete scan result
#[derive(Debug, Serialize)]
pub struct ScanReport {
    /// Target that was scanned
    pub target: String,

    /// Catalog version the signatures came from
    pub catalog_version: String,

    /// Fingerprinted components with evidence
    pub components: Vec<ReportComponent>,

    /// Passive homepage hints, when gathered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive: Option<PageHints>,

    /// Non-fatal probe events recorded during the scan
    pub events: Vec<ProbeEvent>,
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Component")]
    key: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Evidence")]
    evidence: usize,
}

/// Print the report as JSON
pub fn print_json(report: &ScanReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Print the report as a colored summary
pub fn print_pretty(report: &ScanReport, verbose: bool) {
    println!();
    println!(
        "{} {}  {}",
        "Target:".bold(),
        report.target.cyan().bold(),
        format!("(catalog {})", report.catalog_version).dimmed()
    );

    if report.components.is_empty() {
        println!();
        println!("  {}", "No components produced hash evidence.".yellow());
    } else {
        let rows: Vec<ComponentRow> = report
            .components
            .iter()
            .map(|c| ComponentRow {
                group: c.group.clone(),
                key: c.key.clone(),
                version: c.version.clone(),
                evidence: c.evidence_count,
            })
            .collect();

        println!();
        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    if let Some(passive) = &report.passive {
        print_passive(passive);
    }

    if !report.events.is_empty() {
        println!();
        if verbose {
            println!("{}", "Probe events:".bold());
            for event in &report.events {
                match event {
                    ProbeEvent::Rejection {
                        component,
                        path,
                        reason,
                    } => println!("  {} {component} {path}: {reason}", "-".dimmed()),
                    ProbeEvent::ComponentAborted { component, reason } => {
                        println!("  {} {component} aborted: {reason}", "-".red());
                    }
                }
            }
        } else {
            println!(
                "{}",
                format!(
                    "{} probe(s) produced no evidence; use --verbose for details",
                    report.events.len()
                )
                .dimmed()
            );
        }
    }
}

fn print_passive(hints: &PageHints) {
    println!();
    println!("{}", "Passive homepage hints:".bold());

    if let Some(version) = &hints.core_version {
        println!("  {} WordPress {}", "generator:".bold(), version.cyan());
    }
    for hit in &hints.plugins {
        let version = hit.version.as_deref().unwrap_or("?");
        println!("  {} {} {}", "plugin:".bold(), hit.slug, version.dimmed());
    }
    for hit in &hints.themes {
        let version = hit.version.as_deref().unwrap_or("?");
        println!("  {} {} {}", "theme:".bold(), hit.slug, version.dimmed());
    }
}

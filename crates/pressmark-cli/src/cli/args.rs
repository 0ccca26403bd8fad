//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Fingerprint a WordPress site and its plugins/themes
///
/// Compares hashes of well-known static files against a signature
/// catalog to identify which component versions are installed.
#[derive(Parser, Debug)]
#[command(name = "pressmark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Catalog directory (or set PRESSMARK_CATALOG_DIR env var)
    #[arg(long, env = "PRESSMARK_CATALOG_DIR", global = true)]
    pub catalog_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a target site
    Scan(ScanArgs),

    /// Download the latest signature catalog
    Update(UpdateArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Scan command
// ============================================================================

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Target base URL (e.g. https://blog.example)
    pub url: String,

    /// Catalog groups to scan
    #[arg(long, value_delimiter = ',', default_value = "core,plugins,themes")]
    pub groups: Vec<String>,

    /// Also scan the "popular" catalog variants
    #[arg(long)]
    pub popular: bool,

    /// Also scan the "vulnerable" catalog variants
    #[arg(long)]
    pub vulnerable: bool,

    /// Skip the catalog freshness check before scanning
    #[arg(long)]
    pub no_update: bool,

    /// Skip the passive homepage heuristics
    #[arg(long)]
    pub no_passive: bool,

    /// Treat rejected probes as component failures instead of
    /// swallowing them as missing evidence
    #[arg(long)]
    pub strict: bool,

    /// Maximum concurrently in-flight probes
    #[arg(short, long)]
    pub concurrency: Option<usize>,
}

// ============================================================================
// Update command
// ============================================================================

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Re-download even if the local catalog is already the latest
    #[arg(long)]
    pub force: bool,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Print the config file path
    Path,
}

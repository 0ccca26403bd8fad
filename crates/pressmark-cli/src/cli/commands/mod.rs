//! Command implementations.

pub mod config;
pub mod scan;
pub mod update;

use std::path::PathBuf;

use pressmark::catalog::CatalogStore;

use crate::config::Config;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Catalog directory override
    pub catalog_dir: Option<PathBuf>,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,

    /// Disable colors
    pub no_color: bool,
}

impl Context {
    /// Open the catalog store, resolving the directory from the CLI
    /// flag, the config file, or the platform data directory.
    pub fn catalog_store(&self) -> anyhow::Result<CatalogStore> {
        let dir = match &self.catalog_dir {
            Some(dir) => dir.clone(),
            None => match Config::load()?.catalog_dir {
                Some(dir) => dir,
                None => Config::default_catalog_dir()?,
            },
        };
        Ok(CatalogStore::new(dir))
    }
}

//! `pressmark update` - Download the latest signature catalog.

use anyhow::Result;
use colored::Colorize;

use pressmark::catalog::{GroupRequest, RefreshManager, RefreshOptions};
use pressmark::ReleaseClient;

use super::Context;
use crate::cli::args::UpdateArgs;

pub async fn execute(ctx: Context, args: UpdateArgs) -> Result<()> {
    let store = ctx.catalog_store()?;

    // Explicit updates always consult the release API.
    let options = RefreshOptions {
        freshness_window: std::time::Duration::ZERO,
        ..RefreshOptions::default()
    };
    let manager = RefreshManager::with_options(store.clone(), ReleaseClient::new(), options);

    if !args.force {
        let requests = [
            GroupRequest::base("core"),
            GroupRequest::base("plugins"),
            GroupRequest::base("themes"),
        ];
        if !manager.needs_update(&requests).await? {
            println!(
                "Catalog {} is already the latest.",
                store
                    .current_version()
                    .map(|v| v.to_string())
                    .unwrap_or_default()
                    .cyan()
            );
            return Ok(());
        }
    }

    let version = manager.refresh().await?;
    println!(
        "{} Catalog updated to {}.",
        "Success:".green().bold(),
        version.to_string().cyan()
    );
    println!("Stored under {}", store.version_dir(&version).display());

    Ok(())
}

//! `pressmark scan` - Fingerprint a target site.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::Colorize;
use futures_util::StreamExt;
use url::Url;

use pressmark::catalog::{GroupRequest, RefreshManager};
use pressmark::scan::{
    inspect_page, resolve_component, FetchOrchestrator, ProbeLog, ScanOptions,
};
use pressmark::{HttpProber, PressmarkError, ReleaseClient};

use super::Context;
use crate::cli::args::ScanArgs;
use crate::config::Config;
use crate::output::report::{print_json, print_pretty, ReportComponent, ScanReport};
use crate::output::OutputFormat;

const DEFAULT_CONCURRENCY: usize = 32;

pub async fn execute(ctx: Context, args: ScanArgs) -> Result<()> {
    let target = Url::parse(&args.url).context("invalid target URL")?;
    if !matches!(target.scheme(), "http" | "https") {
        anyhow::bail!("target URL must be http or https, got {}", target.scheme());
    }

    let config = Config::load()?;
    let store = ctx.catalog_store()?;

    let requests: Vec<GroupRequest> = args
        .groups
        .iter()
        .map(|g| {
            GroupRequest::base(g.clone())
                .with_popular(args.popular)
                .with_vulnerable(args.vulnerable)
        })
        .collect();

    if !args.no_update && config.auto_update {
        ensure_catalog(&ctx, &store, &requests).await?;
    }

    let catalog = store
        .load_catalog(&requests)
        .context("could not load the signature catalog; try `pressmark update`")?;

    if !catalog.load_errors.is_empty() {
        eprintln!(
            "{} {} catalog document error(s); scanning with what parsed",
            "Warning:".yellow().bold(),
            catalog.load_errors.len()
        );
        if ctx.verbose {
            for error in &catalog.load_errors {
                eprintln!("  {error}");
            }
        }
    }

    let pretty = ctx.output_format == OutputFormat::Pretty;
    if pretty {
        println!(
            "Scanning {} against {} component(s), {} file signature target(s)...",
            target.as_str().cyan(),
            catalog.component_count(),
            catalog.file_count()
        );
    }

    let concurrency = args
        .concurrency
        .or(config.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);
    let prober = Arc::new(HttpProber::new());
    let orchestrator = FetchOrchestrator::with_options(
        Arc::clone(&prober),
        ScanOptions {
            suppress_rejections: !args.strict,
            max_concurrent_probes: concurrency,
        },
    );

    let log = ProbeLog::new();
    let mut components = Vec::new();

    for group in &catalog.groups {
        let mut stream = orchestrator.scan(&target, group, log.clone())?;

        while let Some(item) = stream.next().await {
            let capture = match item {
                Ok(capture) => capture,
                Err(PressmarkError::HostUnreachable(reason)) => {
                    anyhow::bail!("scan aborted, target became unreachable: {reason}");
                }
                Err(err) => return Err(err.into()),
            };

            let Some(list) = group.get_file_list(&capture.key) else {
                continue;
            };

            let resolved = resolve_component(list, &capture.files);
            if !resolved.has_evidence() {
                continue;
            }

            if pretty {
                println!(
                    "  {} {} {} {}",
                    "found".green(),
                    resolved.key.bold(),
                    resolved.version.to_string().cyan(),
                    format!("({} file(s))", resolved.evidence_count).dimmed()
                );
            }

            components.push(ReportComponent {
                group: group.key.clone(),
                key: resolved.key.clone(),
                version: resolved.version.to_string(),
                evidence_count: resolved.evidence_count,
            });
        }
    }

    components.sort_by(|a, b| (&a.group, &a.key).cmp(&(&b.group, &b.key)));

    let passive = if args.no_passive {
        None
    } else {
        gather_passive(&prober, &target).await
    };

    let report = ScanReport {
        target: target.to_string(),
        catalog_version: catalog.version.to_string(),
        components,
        passive,
        events: log.snapshot(),
    };

    match ctx.output_format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Pretty => print_pretty(&report, ctx.verbose),
    }

    Ok(())
}

/// Refresh the catalog when needed. Refresh trouble is only fatal when
/// there is no existing catalog to fall back to.
async fn ensure_catalog(
    ctx: &Context,
    store: &pressmark::catalog::CatalogStore,
    requests: &[GroupRequest],
) -> Result<()> {
    let manager = RefreshManager::new(store.clone(), ReleaseClient::new());

    let needed = match manager.needs_update(requests).await {
        Ok(needed) => needed,
        Err(err) => {
            if store.current_version().is_none() {
                return Err(err).context("no local catalog and the update check failed");
            }
            eprintln!(
                "{} update check failed ({err}); using the existing catalog",
                "Warning:".yellow().bold()
            );
            return Ok(());
        }
    };

    if !needed {
        return Ok(());
    }

    match manager.refresh().await {
        Ok(version) => {
            if ctx.output_format == OutputFormat::Pretty {
                println!("Catalog updated to {}", version.to_string().cyan());
            }
            Ok(())
        }
        Err(err) => {
            if store.current_version().is_none() {
                return Err(err).context("no local catalog and the refresh failed");
            }
            eprintln!(
                "{} catalog refresh failed ({err}); using the existing catalog",
                "Warning:".yellow().bold()
            );
            Ok(())
        }
    }
}

async fn gather_passive(
    prober: &HttpProber,
    target: &Url,
) -> Option<pressmark::scan::PageHints> {
    let html = prober.fetch_page(target).await.ok()?;
    let hints = inspect_page(&html);
    if hints.is_empty() {
        None
    } else {
        Some(hints)
    }
}

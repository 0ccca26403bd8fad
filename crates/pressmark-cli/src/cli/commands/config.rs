//! `pressmark config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(ctx).await,
        ConfigCommands::Set { key, value } => set_config(ctx, &key, &value).await,
        ConfigCommands::Path => show_path(ctx).await,
    }
}

async fn show_config(ctx: Context) -> Result<()> {
    let config = Config::load()?;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Pretty => {
            println!("{}", "Current Configuration:".bold());
            println!();

            let catalog_display = config
                .catalog_dir
                .as_ref()
                .map_or_else(
                    || "(platform default)".dimmed().to_string(),
                    |d| d.display().to_string(),
                );
            println!("  {} {}", "catalog_dir:".bold(), catalog_display);
            println!("  {} {}", "auto_update:".bold(), config.auto_update);
            println!(
                "  {} {}",
                "output_format:".bold(),
                config.output_format.unwrap_or_default()
            );
            println!(
                "  {} {}",
                "concurrency:".bold(),
                config
                    .concurrency
                    .map_or_else(|| "(default)".dimmed().to_string(), |c| c.to_string())
            );
        }
    }

    Ok(())
}

async fn set_config(_ctx: Context, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    match key {
        "catalog_dir" => {
            config.catalog_dir = Some(value.into());
            println!("{} catalog_dir set to {}.", "Success:".green().bold(), value.cyan());
        }
        "auto_update" => {
            config.auto_update = value.parse()?;
            println!("{} auto_update set to {}.", "Success:".green().bold(), value);
        }
        "output_format" | "output" => {
            config.output_format = Some(value.parse()?);
            println!("{} Output format set to {}.", "Success:".green().bold(), value.cyan());
        }
        "concurrency" => {
            config.concurrency = Some(value.parse()?);
            println!("{} concurrency set to {}.", "Success:".green().bold(), value);
        }
        _ => {
            anyhow::bail!(
                "Unknown config key: {}\n\n\
                 Available keys:\n  \
                 catalog_dir    - Where catalog versions are stored\n  \
                 auto_update    - Check for catalog updates before scans (true/false)\n  \
                 output_format  - Default output format (pretty/json)\n  \
                 concurrency    - Default cap on in-flight probes",
                key
            );
        }
    }

    config.save()?;

    Ok(())
}

async fn show_path(_ctx: Context) -> Result<()> {
    let path = Config::path()?;
    println!("{}", path.display());
    Ok(())
}

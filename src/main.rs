//! Clipforge CLI
//!
//! Command-line interface for the clipforge mixer.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clipforge::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    log::info!("Clipforge v{}", env!("CARGO_PKG_VERSION"));

    let settings = commands::load_settings(cli.config.as_deref())
        .context("failed to load mix settings")?;

    match cli.command {
        Commands::Merge {
            speech,
            music,
            output,
            speech_volume,
            music_volume,
        } => commands::merge(
            settings,
            &speech,
            &music,
            &output,
            speech_volume,
            music_volume,
        )
        .with_context(|| format!("failed to write mix to {}", output.display()))?,
        Commands::Render { asset, output } => commands::render(settings, &asset, &output)
            .with_context(|| format!("failed to render {}", asset.display()))?,
        Commands::Batch { dir, output_dir } => {
            let report = commands::batch(settings, &dir, &output_dir)
                .with_context(|| format!("failed to batch render {}", dir.display()))?;
            if !report.failed.is_empty() {
                anyhow::bail!("{} asset(s) failed to render", report.failed.len());
            }
        }
        Commands::Inspect { path } => commands::inspect(&path)
            .with_context(|| format!("failed to inspect {}", path.display()))?,
    }

    Ok(())
}

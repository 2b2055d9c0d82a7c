use std::sync::Arc;

use catchup_engine::{
    DownloadSupervisor, HttpCatalog, HttpPlaylistFetcher, ProcessToolchain, events,
};
use clap::Parser;
use colored::Colorize;
use indicatif::ProgressBar;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod processor;
mod prompt;
mod render;
mod utils;

use cli::CliArgs;
use config::AppConfig;
use error::AppError;
use prompt::TerminalPrompter;
use render::Renderer;

fn main() {
    match bootstrap() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            // Log the full error for debugging
            error!(error = ?e, "Application failed");
            std::process::exit(1);
        }
    }
}

/// Returns `false` when any episode or catalog failed.
#[tokio::main]
async fn bootstrap() -> Result<bool, AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Setup logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else if args.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let app_config = AppConfig::load(args.config.as_deref())?;
    if !app_config.colored_output {
        colored::control::set_override(false);
    }

    info!("catchup {} - catch-up TV and radio downloader", env!("CARGO_PKG_VERSION"));

    let run_config = Arc::new(app_config.run_configuration(&args));
    info!(
        target_dir = %run_config.target_dir.display(),
        dry_run = run_config.dry_run,
        traversal = ?run_config.traversal,
        naming = ?run_config.naming,
        subtitles = run_config.subtitles,
        "Run configuration"
    );

    // Dependency errors abort before any work
    let toolchain = ProcessToolchain::discover(app_config.subtitle_converter.clone()).await?;
    let client = run_config.http_client()?;
    utils::create_dirs(&run_config.target_dir).await?;

    let bar = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    let (tx, rx) = events::channel();
    let renderer = tokio::spawn(Renderer::new(bar.clone(), app_config.colored_output).run(rx));

    let catalog = HttpCatalog::new(client.clone(), run_config.subtitle_lang.clone());
    let supervisor = DownloadSupervisor::new(
        run_config,
        Arc::new(toolchain),
        Arc::new(HttpPlaylistFetcher::new(client.clone())),
        Arc::new(TerminalPrompter::new(bar)),
        client,
        tx,
    );

    let result = processor::process_inputs(&args.urls, &catalog, &supervisor).await;

    // Dropping the supervisor closes the channel and lets the renderer drain.
    drop(supervisor);
    if let Err(e) = renderer.await {
        error!("Renderer task failed: {e}");
    }

    let summary = result?;
    let line = format!(
        "{} episode(s): {} completed, {} available, {} skipped, {} unavailable, {} failed",
        summary.total(),
        summary.completed,
        summary.available,
        summary.skipped,
        summary.unavailable,
        summary.failed
    );
    if summary.has_failures() {
        eprintln!("{}", line.yellow());
    } else {
        eprintln!("{}", line.green());
    }

    Ok(!summary.has_failures())
}

//! probekeeper CLI - keeps probing your API
//!
//! Serves metrics and status while the refresh and execute loops run.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use probekeeper::aggregator::Aggregator;
use probekeeper::api::{self, AppState};
use probekeeper::config::{RunVariables, Settings};
use probekeeper::runner::NewmanCli;
use probekeeper::scheduler::Scheduler;
use probekeeper::transform::PortmanCli;

/// probekeeper - synthetic monitoring for HTTP APIs
#[derive(Debug, Parser)]
#[command(name = "probekeeper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    settings: Settings,
}

fn setup_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.json);

    if let Err(e) = run(cli.settings).await {
        tracing::error!(error = %format!("{e:#}"), "Fatal error, exiting");
        return Err(e);
    }
    Ok(())
}

async fn run(settings: Settings) -> Result<()> {
    settings.validate().context("Invalid settings")?;
    let settings = Arc::new(settings);

    let variables = Arc::new(RunVariables::from_env());
    if !variables.is_empty() {
        tracing::info!(
            count = variables.len(),
            names = ?variables.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            "Run variables loaded from environment"
        );
    }

    let listener = api::bind(settings.port)
        .await
        .with_context(|| format!("Failed to bind port {}", settings.port))?;

    let aggregator = Aggregator::new(&settings.work_dir);
    let generator = Arc::new(PortmanCli::new(
        &settings.portman_bin,
        &settings.transformer_config,
    ));
    let engine = Arc::new(NewmanCli::new(&settings.newman_bin));

    let mut scheduler = Scheduler::new(
        Arc::clone(&settings),
        generator,
        engine,
        aggregator.clone(),
        variables,
    );
    let initial = scheduler
        .prepare()
        .await
        .context("Initial refresh failed")?;

    tracing::info!(
        port = settings.port,
        metrics = %settings.metrics_path,
        status_enabled = settings.status_enabled,
        collection = %initial.collection.display(),
        run_interval_secs = settings.run_interval,
        refresh_interval_secs = settings.refresh_interval,
        "probekeeper started"
    );

    let state = AppState::new(aggregator, Arc::clone(&settings));
    let stopped = tokio::select! {
        result = api::serve(listener, state) => result.context("HTTP server failed"),
        result = scheduler.run(initial) => result.context("Scheduler failed"),
    };
    stopped?;
    anyhow::bail!("Service stopped unexpectedly")
}

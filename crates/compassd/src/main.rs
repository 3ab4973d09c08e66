//! Compass Daemon - query orchestrator
//!
//! Accepts a query plus an optional vision, fans out to the enabled
//! providers, and answers with a summary, a plan and ranked sources.

use anyhow::{Context, Result};
use clap::Parser;
use compassd::config::Config;
use compassd::orchestrator::Orchestrator;
use compassd::providers::ProviderSet;
use compassd::server::{self, AppState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compassd")]
#[command(about = "Compass daemon - query orchestrator", long_about = None)]
#[command(version = compass_common::VERSION)]
struct Cli {
    /// Config file (overrides $COMPASS_CONFIG and the default locations)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address (overrides [server].bind_addr)
    #[arg(long)]
    bind: Option<String>,

    /// Write the default config to this path and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(path) = cli.write_default_config {
        return Config::save_default(&path);
    }

    info!("Compass Daemon v{} starting", compass_common::VERSION);

    let config = Config::load(cli.config.as_deref());
    let providers = ProviderSet::from_config(&config).context("Failed to set up providers")?;
    info!(
        "  Providers: {}",
        providers
            .capabilities()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let orchestrator = Orchestrator::from_config(&config, providers);
    let state = AppState::new(
        orchestrator,
        &config.server,
        config.orchestrator.request_deadline(),
    );

    let addr = cli.bind.unwrap_or_else(|| config.server.bind_addr.clone());
    server::run(state, &addr).await
}

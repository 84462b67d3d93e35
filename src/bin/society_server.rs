//! Society engine server
//!
//! Populates the world, runs the simulation clock and serves the
//! WebSocket gateway until Ctrl-C.

use clap::Parser;
use society::core::config::SocietyConfig;
use society::gateway::run_server;
use society::llm::list_models;
use society::world::WorldMode;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Society engine - authoritative world simulation behind a WebSocket gateway
#[derive(Parser, Debug)]
#[command(name = "society_server")]
#[command(about = "Run the agent society simulation and serve it over WebSocket")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(long)]
    bind: Option<String>,

    /// Random seed for a reproducible world
    #[arg(long)]
    seed: Option<u64>,

    /// Initial mode: cooperative, competitive or survival
    #[arg(long)]
    mode: Option<WorldMode>,

    /// Ask the local Ollama server which models to assign to agents
    #[arg(long)]
    discover_models: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("society=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SocietyConfig::load(path)?,
        None => SocietyConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }
    if let Some(mode) = args.mode {
        config.world.mode = mode;
    }
    if args.discover_models {
        config.server.discover_models = true;
    }
    config.validate()?;

    if config.server.discover_models {
        match list_models(&config.server.ollama_url, &config.agents.exclude_models).await {
            Ok(models) if !models.is_empty() => {
                tracing::info!(?models, "discovered models");
                config.world.models = models;
            }
            Ok(_) => tracing::warn!("no usable models found, keeping configured labels"),
            Err(e) => tracing::warn!(error = %e, "model discovery failed, keeping configured labels"),
        }
    }

    tracing::info!(
        agents = config.world.agent_count,
        mode = config.world.mode.as_str(),
        "Starting society engine"
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    run_server(config, listener, shutdown_rx).await?;
    Ok(())
}

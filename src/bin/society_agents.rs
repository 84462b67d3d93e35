//! Reference decision layer
//!
//! Connects to the engine gateway, keeps the latest world snapshot and once
//! per decision period asks a random subset of agents for their next move.
//! Decisions run concurrently; a failed model call falls back to a random
//! wander so the agent still acts.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use society::core::config::SocietyConfig;
use society::gateway::{ClientMessage, ServerMessage};
use society::llm::{decide, fallback_intent, AgentContext, LlmClient};
use society::world::World;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Agent runner - asks an LLM what each agent does next
#[derive(Parser, Debug)]
#[command(name = "society_agents")]
#[command(about = "Drive society agents with LLM decisions over the gateway")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gateway URL, overrides the config file
    #[arg(long)]
    engine: Option<String>,

    /// LLM endpoint, overrides the config file
    #[arg(long)]
    llm: Option<String>,

    /// Random seed for agent selection
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("society=info,society_agents=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => SocietyConfig::load(path)?,
        None => SocietyConfig::default(),
    };
    if let Some(engine) = args.engine {
        config.agents.engine_url = engine;
    }
    if let Some(llm) = args.llm {
        config.agents.llm_url = llm;
    }
    config.validate()?;
    let runner = config.agents;

    let client = LlmClient::from_config(&runner)?;
    let mut rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    tracing::info!(engine = %runner.engine_url, "Starting agent runner");
    let (ws, _) = connect_async(runner.engine_url.as_str()).await?;
    let (mut write, mut read) = ws.split();

    let (latest_tx, latest_rx) = watch::channel::<Option<Arc<World>>>(None);
    let (frames_tx, mut frames_rx) = mpsc::channel::<String>(64);

    let writer = tokio::spawn(async move {
        while let Some(frame) = frames_rx.recv().await {
            if write.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    let reader = tokio::spawn(async move {
        while let Some(Ok(message)) = read.next().await {
            let Message::Text(text) = message else { continue };
            match serde_json::from_str::<ServerMessage>(&text) {
                Ok(ServerMessage::WorldState { state }) => {
                    let _ = latest_tx.send(Some(Arc::new(state)));
                }
                Ok(ServerMessage::IntentAck { agent_id, .. }) => {
                    tracing::trace!(agent = %agent_id, "intent acknowledged");
                }
                Ok(ServerMessage::Error { message }) => {
                    tracing::warn!(%message, "engine rejected request");
                }
                Err(e) => tracing::debug!(error = %e, "unreadable frame"),
            }
        }
        tracing::info!("engine connection closed");
    });

    let mut period = tokio::time::interval(Duration::from_millis(runner.decision_period_ms));
    loop {
        tokio::select! {
            _ = period.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        if reader.is_finished() {
            break;
        }
        let Some(world) = latest_rx.borrow().clone() else {
            tracing::info!("waiting for engine");
            continue;
        };

        let mut decisions = JoinSet::new();
        for agent in world.agents() {
            if !rng.gen_bool(runner.decision_probability) {
                continue;
            }
            let context = AgentContext::from_world(&world, agent);
            let model = agent.model.clone().unwrap_or_else(|| runner.default_model.clone());
            let client = client.clone();
            let frames = frames_tx.clone();
            let agent_id = agent.id.clone();
            let (width, height) = (world.width, world.height);

            decisions.spawn(async move {
                let intent = match decide(&client, &model, &context).await {
                    Ok(intent) => intent,
                    Err(e) => {
                        tracing::debug!(agent = %agent_id, error = %e, "decision failed, using fallback");
                        let mut rng = rand::thread_rng();
                        fallback_intent(&mut rng, width, height)
                    }
                };
                match ClientMessage::submit(&agent_id, &intent).and_then(|m| m.to_frame()) {
                    Ok(frame) => {
                        let _ = frames.send(frame).await;
                    }
                    Err(e) => tracing::warn!(agent = %agent_id, error = %e, "could not encode intent"),
                }
            });
        }
        while decisions.join_next().await.is_some() {}
    }

    drop(frames_tx);
    let _ = writer.await;
    reader.abort();
    tracing::info!("agent runner stopped");
    Ok(())
}

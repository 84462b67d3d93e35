//! WebSocket server: intent ingestion, controls, snapshot fan-out
//!
//! The gateway owns no simulation logic. It decodes requests, routes them
//! into the shared `Simulation` under its lock, and forwards snapshot frames
//! from the cadence task to every connected client.

use crate::core::config::SocietyConfig;
use crate::core::error::{Result, SocietyError};
use crate::gateway::protocol::{decode_client_message, world_state_frame, ClientMessage, ServerMessage};
use crate::intent::IntentSubmission;
use crate::simulation::{lock, run_cadence, SharedSimulation, Simulation, SnapshotSink};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Pause before accepting again after an accept error
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Result of handling one client request
#[derive(Debug, Default, PartialEq)]
pub struct Dispatch {
    /// Sent back to the requesting client only
    pub reply: Option<String>,
    /// Pushed to every connected client
    pub broadcast: Option<String>,
}

impl Dispatch {
    fn reply(frame: String) -> Self {
        Self {
            reply: Some(frame),
            broadcast: None,
        }
    }
}

pub struct Gateway {
    simulation: SharedSimulation,
    frames: broadcast::Sender<Arc<str>>,
}

impl Gateway {
    pub fn new(simulation: SharedSimulation, capacity: usize) -> Self {
        let (frames, _) = broadcast::channel(capacity.max(1));
        Self { simulation, frames }
    }

    pub fn simulation(&self) -> &SharedSimulation {
        &self.simulation
    }

    /// Sink for the cadence task; never blocks, drops when nobody listens
    pub fn snapshot_sink(&self) -> impl SnapshotSink {
        let frames = self.frames.clone();
        move |snapshot: String| {
            let _ = frames.send(Arc::from(world_state_frame(&snapshot)));
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.frames.subscribe()
    }

    fn publish(&self, frame: String) {
        let _ = self.frames.send(Arc::from(frame));
    }

    pub fn state_frame(&self) -> Result<String> {
        let snapshot = lock(&self.simulation)?.snapshot_json()?;
        Ok(world_state_frame(&snapshot))
    }

    /// Handle one text frame from a client
    ///
    /// Client mistakes come back as `error` frames; only a poisoned
    /// simulation is returned as `Err`.
    pub fn dispatch(&self, text: &str) -> Result<Dispatch> {
        match self.handle(text) {
            Ok(dispatch) => Ok(dispatch),
            Err(SocietyError::MalformedRequest(message)) => {
                warn!(%message, "rejected client request");
                Ok(Dispatch::reply(ServerMessage::error(message).to_frame()?))
            }
            Err(err) => Err(err),
        }
    }

    fn handle(&self, text: &str) -> Result<Dispatch> {
        match decode_client_message(text)? {
            ClientMessage::SubmitIntent { agent_id, intent } => {
                let submission = IntentSubmission::from_parts(agent_id, intent)?;
                let outcome = lock(&self.simulation)?
                    .apply_intent(&submission.agent_id, &submission.intent);
                debug!(agent = %submission.agent_id, ?outcome, "intent applied");
                Ok(Dispatch::reply(ServerMessage::ack(submission.agent_id).to_frame()?))
            }
            ClientMessage::GetState => Ok(Dispatch::reply(self.state_frame()?)),
            ClientMessage::SetMode { mode } => {
                lock(&self.simulation)?.set_mode(mode);
                Ok(Dispatch::default())
            }
            ClientMessage::SetPaused { paused } => {
                lock(&self.simulation)?.set_paused(paused);
                Ok(Dispatch::default())
            }
            ClientMessage::SetSpeed { speed } => {
                lock(&self.simulation)?.set_speed(speed)?;
                Ok(Dispatch::default())
            }
            ClientMessage::Step => {
                let snapshot = {
                    let mut simulation = lock(&self.simulation)?;
                    if !simulation.step() {
                        return Ok(Dispatch::default());
                    }
                    simulation.snapshot_json()?
                };
                Ok(Dispatch {
                    reply: None,
                    broadcast: Some(world_state_frame(&snapshot)),
                })
            }
        }
    }

    /// Accept connections until shutdown
    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!(addr = ?listener.local_addr().ok(), "gateway listening");
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    if let Some(backoff) = Self::on_accept(&self, accepted, &shutdown) {
                        tokio::time::sleep(backoff).await;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("gateway stopped");
        Ok(())
    }

    /// Spawn a connection task, or return how long to back off after a
    /// failed accept (e.g. out of file descriptors)
    fn on_accept(
        gateway: &Arc<Self>,
        accepted: std::io::Result<(TcpStream, SocketAddr)>,
        shutdown: &watch::Receiver<bool>,
    ) -> Option<Duration> {
        let (stream, addr) = match accepted {
            Ok(pair) => pair,
            Err(err) => {
                warn!(%err, "accept failed, retrying");
                return Some(ACCEPT_BACKOFF);
            }
        };
        let gateway = Arc::clone(gateway);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) = gateway.handle_connection(stream, addr, shutdown).await {
                debug!(%addr, %err, "connection closed with error");
            }
        });
        None
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        addr: SocketAddr,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let ws = accept_async(stream).await?;
        info!(%addr, "client connected");
        let (mut write, mut read) = ws.split();
        let mut frames = self.subscribe();

        write.send(Message::Text(self.state_frame()?)).await?;

        loop {
            tokio::select! {
                incoming = read.next() => {
                    let text = match incoming {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                            Ok(text) => text,
                            Err(_) => continue,
                        },
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => continue,
                        Some(Err(err)) => return Err(err.into()),
                    };
                    let dispatch = self.dispatch(&text)?;
                    if let Some(frame) = dispatch.broadcast {
                        self.publish(frame);
                    }
                    if let Some(reply) = dispatch.reply {
                        write.send(Message::Text(reply)).await?;
                    }
                }
                frame = frames.recv() => match frame {
                    Ok(frame) => write.send(Message::Text(frame.to_string())).await?,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(%addr, skipped, "slow observer skipped snapshots");
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        info!(%addr, "client disconnected");
        Ok(())
    }
}

/// Build the simulation, start the clock and serve until shutdown
pub async fn run_server(
    config: SocietyConfig,
    listener: TcpListener,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let simulation = Simulation::from_config(&config).into_shared();
    run_gateway(simulation, &config, listener, shutdown).await
}

/// Serve an existing simulation; used by `run_server` and tests
pub async fn run_gateway(
    simulation: SharedSimulation,
    config: &SocietyConfig,
    listener: TcpListener,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let gateway = Arc::new(Gateway::new(simulation.clone(), config.server.broadcast_capacity));

    let cadence = tokio::spawn(run_cadence(
        simulation,
        config.clock.interval(),
        gateway.snapshot_sink(),
        shutdown.clone(),
    ));

    let served = Arc::clone(&gateway).serve(listener, shutdown).await;
    if served.is_err() {
        cadence.abort();
        let _ = cadence.await;
        return served;
    }
    match cadence.await {
        Ok(result) => result?,
        Err(join) => {
            return Err(SocietyError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("clock task failed: {join}"),
            )))
        }
    }
    served
}

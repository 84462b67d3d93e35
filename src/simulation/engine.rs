//! The simulation handle
//!
//! `Simulation` owns the world together with everything needed to advance
//! it: rules, clock accumulator, random source and time source. The server
//! shares it behind one mutex; every tick and every intent application is
//! one critical section.

use crate::core::config::{ClockConfig, SimulationConfig, SocietyConfig};
use crate::core::error::{Result, SocietyError};
use crate::core::time::{SystemClock, TimeSource};
use crate::core::types::AgentId;
use crate::intent::Intent;
use crate::simulation::clock::SimulationClock;
use crate::simulation::intent::{apply_intent, IntentOutcome};
use crate::simulation::tick::{run_simulation_tick, SimulationEvent};
use crate::world::{populate, World, WorldMode};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex, MutexGuard};

pub type SharedSimulation = Arc<Mutex<Simulation>>;

/// Lock the shared simulation, surfacing poisoning as an error
pub fn lock(simulation: &SharedSimulation) -> Result<MutexGuard<'_, Simulation>> {
    simulation.lock().map_err(|_| SocietyError::Poisoned)
}

pub struct Simulation {
    world: World,
    config: SimulationConfig,
    clock: SimulationClock,
    rng: Box<dyn RngCore + Send>,
    time: Arc<dyn TimeSource>,
}

impl Simulation {
    /// Wrap an already populated world, with OS entropy and the system clock
    pub fn new(world: World, config: SimulationConfig, clock: &ClockConfig) -> Self {
        Self {
            world,
            config,
            clock: SimulationClock::new(clock),
            rng: Box::new(ChaCha8Rng::from_entropy()),
            time: Arc::new(SystemClock),
        }
    }

    /// Populate a fresh world from configuration
    ///
    /// With `world.seed` set, placement, respawn and message ids are all
    /// drawn from one seeded stream.
    pub fn from_config(config: &SocietyConfig) -> Self {
        let mut rng = match config.world.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let world = populate(&config.world, &mut rng);
        Self::new(world, config.simulation.clone(), &config.clock).with_rng(rng)
    }

    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    pub fn into_shared(self) -> SharedSimulation {
        Arc::new(Mutex::new(self))
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access for setup before the clock starts
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Apply one intent atomically
    pub fn apply_intent(&mut self, agent_id: &AgentId, intent: &Intent) -> IntentOutcome {
        let now = self.time.now_millis();
        apply_intent(&mut self.world, &self.config, agent_id, intent, now, &mut self.rng)
    }

    /// Advance the world by exactly one tick
    pub fn tick(&mut self) -> Vec<SimulationEvent> {
        let now = self.time.now_millis();
        let events = run_simulation_tick(&mut self.world, &self.config, now, &mut self.rng);
        for event in &events {
            match event {
                SimulationEvent::Arrived { agent, tick } => {
                    tracing::trace!(%agent, tick, "agent arrived")
                }
                SimulationEvent::CooldownEnded { agent, tick } => {
                    tracing::trace!(%agent, tick, "conflict cooldown ended")
                }
                _ => {}
            }
        }
        events
    }

    /// Consult the clock for how many ticks this cadence interval owes
    pub fn ticks_due(&mut self) -> u32 {
        self.clock
            .ticks_due(self.world.is_paused(), self.world.speed())
    }

    /// Cadence tick; skipped once the world has been paused
    pub fn tick_if_running(&mut self) -> bool {
        if self.world.is_paused() {
            return false;
        }
        self.tick();
        true
    }

    /// Single manual tick; only honoured while paused
    pub fn step(&mut self) -> bool {
        if !self.world.is_paused() {
            tracing::debug!("step ignored while running");
            return false;
        }
        self.tick();
        true
    }

    pub fn set_mode(&mut self, mode: WorldMode) {
        tracing::info!(?mode, "mode changed");
        self.world.set_mode(mode);
    }

    pub fn set_paused(&mut self, paused: bool) {
        tracing::info!(paused, "pause toggled");
        self.world.set_paused(paused);
    }

    /// Speed must be finite and non-negative
    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(SocietyError::MalformedRequest(format!(
                "speed must be a non-negative number, got {speed}"
            )));
        }
        tracing::info!(speed, "speed changed");
        self.world.set_speed(speed);
        Ok(())
    }

    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.world)?)
    }
}

//! Simulation clock - turns wall-clock cadence into ticks
//!
//! Every cadence interval the clock adds the current speed to a fractional
//! accumulator and fires one tick per whole unit accumulated. Speed 0.1
//! therefore fires a tick about every tenth interval and speed 2 fires two
//! per interval. After each interval, tick or not, a snapshot is published
//! so observers get a heartbeat even while paused.

use crate::core::config::ClockConfig;
use crate::core::error::Result;
use crate::simulation::engine::{lock, SharedSimulation};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Fractional tick accumulator
#[derive(Debug, Clone)]
pub struct SimulationClock {
    accumulator: f64,
    max_ticks_per_interval: u32,
}

impl SimulationClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            accumulator: 0.0,
            max_ticks_per_interval: config.max_ticks_per_interval,
        }
    }

    /// Ticks due for one cadence interval at the given speed
    ///
    /// Nothing accumulates while paused. Whole ticks beyond the per-interval
    /// cap are dropped rather than carried over.
    pub fn ticks_due(&mut self, paused: bool, speed: f64) -> u32 {
        if paused {
            return 0;
        }
        self.accumulator += speed;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;

        let cap = self.max_ticks_per_interval as f64;
        if whole > cap {
            tracing::debug!(due = whole, cap, "clock catch-up capped");
            return self.max_ticks_per_interval;
        }
        whole as u32
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }
}

/// Receives a serialized snapshot after every cadence interval
///
/// Implementations must not block; a slow observer drops snapshots.
pub trait SnapshotSink: Send {
    fn publish(&mut self, snapshot: String);
}

impl<F: FnMut(String) + Send> SnapshotSink for F {
    fn publish(&mut self, snapshot: String) {
        self(snapshot)
    }
}

/// Drive the simulation until `shutdown` flips to true
///
/// The lock is taken once to decide how many ticks are due, once per tick,
/// and once for the snapshot, so intents can interleave between ticks but
/// never inside one.
pub async fn run_cadence<S: SnapshotSink>(
    simulation: SharedSimulation,
    interval: Duration,
    mut sink: S,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(interval_ms = interval.as_secs_f64() * 1000.0, "simulation clock started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let due = lock(&simulation)?.ticks_due();
        for _ in 0..due {
            // A pause can land between the due count and any of its ticks
            if !lock(&simulation)?.tick_if_running() {
                break;
            }
        }
        let snapshot = lock(&simulation)?.snapshot_json()?;
        sink.publish(snapshot);
    }

    tracing::info!("simulation clock stopped");
    Ok(())
}

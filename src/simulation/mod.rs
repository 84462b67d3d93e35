//! Simulation core: intent processor, tick engine and clock

pub mod clock;
pub mod engine;
pub mod intent;
pub mod tick;

pub use clock::{run_cadence, SimulationClock, SnapshotSink};
pub use engine::{lock, SharedSimulation, Simulation};
pub use intent::{apply_intent, IgnoreReason, IntentOutcome};
pub use tick::{move_toward_target, run_simulation_tick, SimulationEvent};

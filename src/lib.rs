//! Society - agent society simulation engine
//!
//! An authoritative world advanced in fixed ticks, mutated by intents that
//! arrive out of band, and streamed to observers over a WebSocket gateway.

pub mod core;
pub mod entity;
pub mod gateway;
pub mod intent;
pub mod llm;
pub mod simulation;
pub mod world;

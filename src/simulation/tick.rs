//! Tick system - advances the whole world by one discrete step
//!
//! Each tick processes every agent in list order:
//! 1. Thought bubble expiry
//! 2. Conflict cooldown (an agent in cooldown skips steps 3-5)
//! 3. Movement toward the target position
//! 4. Periodic upkeep (cost of living, mode hazard hook)
//! 5. Resource collection
//!
//! then runs the world-level systems:
//! 6. Message retention sweep and delivery
//! 7. Stochastic resource respawn

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, Millis, ResourceId, Tick};
use crate::entity::{Agent, Resource};
use crate::world::{World, WorldMode};
use rand::Rng;

/// Slack on arrival so float error never costs an extra tick
const ARRIVAL_EPSILON: f64 = 1e-9;

/// Events generated during a simulation tick
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    /// An agent reached its target position
    Arrived { agent: AgentId, tick: Tick },
    /// An agent's conflict cooldown ran out this tick
    CooldownEnded { agent: AgentId, tick: Tick },
    /// An agent collected from a resource
    Collected {
        agent: AgentId,
        resource: ResourceId,
        amount: f64,
    },
    /// Messages marked delivered this tick
    MessagesDelivered { count: usize },
    /// Delivered messages dropped for age
    MessagesPurged { count: usize },
    /// A resource grew back a little
    ResourceRegrown { resource: ResourceId },
}

/// Run a single simulation tick
///
/// `now` is the wall-clock instant used for thought and message expiry;
/// `rng` drives resource respawn.
pub fn run_simulation_tick<R: Rng + ?Sized>(
    world: &mut World,
    config: &SimulationConfig,
    now: Millis,
    rng: &mut R,
) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    let tick = world.advance_tick();
    let mode = world.mode();
    let upkeep_due = tick % config.upkeep_interval_ticks == 0;

    let (agents, resources) = world.agents_and_resources_mut();
    for agent in agents.iter_mut() {
        agent.expire_thought(now);

        if agent.conflict_wait > 0 {
            agent.conflict_wait -= 1;
            if agent.conflict_wait == 0 {
                events.push(SimulationEvent::CooldownEnded {
                    agent: agent.id.clone(),
                    tick,
                });
            }
            continue;
        }

        if move_toward_target(agent, config.agent_speed) {
            events.push(SimulationEvent::Arrived {
                agent: agent.id.clone(),
                tick,
            });
        }

        if upkeep_due {
            agent.energy = (agent.energy - config.upkeep_cost).max(0.0);
            apply_mode_hazard(mode, agent);
        }

        collect_resources(agent, resources, config, &mut events);
    }

    sweep_messages(world, config, now, &mut events);
    respawn_resources(world.resources_mut(), config, rng, &mut events);

    debug_assert_invariants(world);
    events
}

/// Step an agent toward its target; returns true on arrival
///
/// Straight-line interpolation at a fixed speed. Within one step of the
/// target the agent snaps onto it and stops.
pub fn move_toward_target(agent: &mut Agent, speed: f64) -> bool {
    let Some(target) = agent.target_pos else {
        return false;
    };
    let delta = target - agent.position;
    let dist = delta.length();

    if dist > speed + ARRIVAL_EPSILON {
        let velocity = delta * (speed / dist);
        agent.position = agent.position + velocity;
        agent.velocity = velocity;
        false
    } else {
        agent.position = target;
        agent.velocity = crate::core::types::Vec2::ZERO;
        agent.target_pos = None;
        true
    }
}

/// Mode-specific upkeep hook
///
/// Survival hazards (e.g. damaging zones) would go here; no mode charges
/// anything beyond the base upkeep yet.
fn apply_mode_hazard(mode: WorldMode, _agent: &mut Agent) {
    match mode {
        WorldMode::Survival => {}
        WorldMode::Cooperative | WorldMode::Competitive => {}
    }
}

/// Collect from every non-empty resource in range
///
/// An agent standing near several resources drains all of them at once.
fn collect_resources(
    agent: &mut Agent,
    resources: &mut [Resource],
    config: &SimulationConfig,
    events: &mut Vec<SimulationEvent>,
) {
    for resource in resources.iter_mut() {
        if resource.is_depleted()
            || agent.position.distance(&resource.position) >= config.collection_radius
        {
            continue;
        }
        let taken = resource.collect(config.collection_amount);
        agent.energy += taken;
        events.push(SimulationEvent::Collected {
            agent: agent.id.clone(),
            resource: resource.id.clone(),
            amount: taken,
        });
    }
}

/// Purge stale delivered messages, then deliver everything left
fn sweep_messages(
    world: &mut World,
    config: &SimulationConfig,
    now: Millis,
    events: &mut Vec<SimulationEvent>,
) {
    let messages = world.messages_mut();
    let before = messages.len();
    messages.retain(|m| !m.is_expired(now, config.message_retention_ms));
    let purged = before - messages.len();

    let mut delivered = 0;
    for message in messages.iter_mut().filter(|m| !m.delivered) {
        message.delivered = true;
        delivered += 1;
    }

    if purged > 0 {
        events.push(SimulationEvent::MessagesPurged { count: purged });
    }
    if delivered > 0 {
        events.push(SimulationEvent::MessagesDelivered { count: delivered });
    }
}

/// Each resource below its maximum independently rolls to regrow
fn respawn_resources<R: Rng + ?Sized>(
    resources: &mut [Resource],
    config: &SimulationConfig,
    rng: &mut R,
    events: &mut Vec<SimulationEvent>,
) {
    for resource in resources.iter_mut().filter(|r| !r.is_full()) {
        if rng.gen_bool(config.respawn_chance) {
            resource.regrow(config.respawn_amount);
            events.push(SimulationEvent::ResourceRegrown {
                resource: resource.id.clone(),
            });
        }
    }
}

fn debug_assert_invariants(world: &World) {
    if cfg!(debug_assertions) {
        for agent in world.agents() {
            assert!(
                agent.energy >= 0.0 && agent.energy.is_finite(),
                "agent {} has invalid energy {}",
                agent.id,
                agent.energy
            );
            assert!(agent.position.is_finite(), "agent {} left the plane", agent.id);
        }
        for resource in world.resources() {
            assert!(
                (0.0..=resource.max_amount).contains(&resource.amount),
                "resource {} amount {} outside [0, {}]",
                resource.id,
                resource.amount,
                resource.max_amount
            );
        }
    }
}

//! Initial population of a fresh world
//!
//! Runs once at startup, before the clock starts ticking.

use crate::core::config::WorldInit;
use crate::core::types::{AgentId, ResourceId, Vec2};
use crate::entity::{Agent, Resource};
use crate::world::World;
use rand::Rng;

/// Build a world with agents and resources scattered inside the margins
pub fn populate<R: Rng + ?Sized>(init: &WorldInit, rng: &mut R) -> World {
    let mut world = World::new(init.width, init.height, init.mode);

    for i in 0..init.agent_count {
        let faction = init.factions[i % init.factions.len()];
        let mut agent = Agent::new(
            AgentId::new(format!("agent_{i}")),
            format!("Agent {i}"),
            faction,
            random_position(init, rng),
        )
        .with_energy(init.starting_energy);
        if !init.models.is_empty() {
            agent = agent.with_model(init.models[i % init.models.len()].clone());
        }
        world.add_agent(agent);
    }

    for i in 0..init.resource_count {
        let resource = Resource::new(
            ResourceId::new(format!("res_{i}")),
            random_position(init, rng),
            init.resource_max_amount,
        )
        .with_amount(init.resource_amount);
        world.add_resource(resource);
    }

    tracing::info!(
        agents = world.agent_count(),
        resources = world.resources().len(),
        mode = ?world.mode(),
        "world populated"
    );
    world
}

fn random_position<R: Rng + ?Sized>(init: &WorldInit, rng: &mut R) -> Vec2 {
    let m = init.placement_margin;
    Vec2::new(
        rng.gen_range(m..init.width - m),
        rng.gen_range(m..init.height - m),
    )
}

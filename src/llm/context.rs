//! Gather per-agent context for decision prompts
//!
//! Builds the view one agent gets of the world snapshot: who it is, what the
//! current mode asks of it, and where everyone else stands.

use crate::core::types::{AgentId, Vec2};
use crate::entity::Agent;
use crate::world::{World, WorldMode};

/// Another agent as seen from the deciding agent
pub struct NearbyAgent {
    pub id: AgentId,
    pub name: String,
    pub position: Vec2,
    pub trust: i32,
    pub allied: bool,
}

/// Everything the prompt needs for one agent
pub struct AgentContext {
    pub agent_id: AgentId,
    pub name: String,
    pub faction: &'static str,
    pub energy: f64,
    pub position: Vec2,
    pub mode: WorldMode,
    pub resource_count: usize,
    pub others: Vec<NearbyAgent>,
    pub width: f64,
    pub height: f64,
}

impl AgentContext {
    /// Build the context for `agent` from a snapshot it belongs to
    pub fn from_world(world: &World, agent: &Agent) -> Self {
        let others = world
            .agents()
            .iter()
            .filter(|other| other.id != agent.id)
            .map(|other| NearbyAgent {
                id: other.id.clone(),
                name: other.name.clone(),
                position: other.position,
                trust: agent.trust_toward(&other.id),
                allied: agent.is_allied_with(&other.id),
            })
            .collect();

        Self {
            agent_id: agent.id.clone(),
            name: agent.name.clone(),
            faction: agent.faction.as_str(),
            energy: agent.energy,
            position: agent.position,
            mode: world.mode(),
            resource_count: world.resources().len(),
            others,
            width: world.width,
            height: world.height,
        }
    }

    pub fn goal(&self) -> &'static str {
        match self.mode {
            WorldMode::Cooperative => "cooperate, accumulate wealth together",
            WorldMode::Competitive => "compete, attack rivals, grab resources",
            WorldMode::Survival => "survive by any means",
        }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are Agent {} (Faction: {}) in a 2D simulation. Your energy is {:.1}.\n\
             The current mode is {}.\n\
             Your goal: {}.\n\n{}",
            self.name,
            self.faction,
            self.energy,
            self.mode.as_str(),
            self.goal(),
            DECISION_SCHEMA
        )
    }

    pub fn user_prompt(&self) -> String {
        let nearby: Vec<String> = self
            .others
            .iter()
            .map(|other| {
                let mut line = format!(
                    "{} [{}] at x:{},y:{}",
                    other.name,
                    other.id,
                    other.position.x.round(),
                    other.position.y.round()
                );
                if other.trust != 0 {
                    line.push_str(&format!(" trust:{}", other.trust));
                }
                if other.allied {
                    line.push_str(" (ally)");
                }
                line
            })
            .collect();

        format!(
            "Your position: x:{},y:{} in a {}x{} world\n\
             Available resources: {}\n\
             Nearby agents: {}\n\
             Decide your next move. JSON only.",
            self.position.x.round(),
            self.position.y.round(),
            self.width,
            self.height,
            self.resource_count,
            nearby.join(", ")
        )
    }
}

const DECISION_SCHEMA: &str = r#"Output JSON strictly matching this schema:
{
  "action": "idle" | "move" | "trade" | "attack" | "ally",
  "target": {"x": number, "y": number} | {"id": "string"},
  "message": {"receiverId": "string", "content": "string"},
  "thought": "detailed explanation of why you are doing this",
  "confidence": 0.0 to 1.0
}"#;

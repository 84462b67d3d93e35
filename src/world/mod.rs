//! The aggregate world state
//!
//! `World` is the single source of truth for agents, resources and messages.
//! It is also the snapshot format: serializing it produces exactly what
//! observers receive.

pub mod populate;

use crate::core::types::{AgentId, Tick};
use crate::entity::{Agent, Message, Resource};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

pub use populate::populate;

/// Game mode surfaced to the decision layer
///
/// The engine does not branch on it apart from the survival hazard hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldMode {
    #[default]
    Cooperative,
    Competitive,
    Survival,
}

impl WorldMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorldMode::Cooperative => "cooperative",
            WorldMode::Competitive => "competitive",
            WorldMode::Survival => "survival",
        }
    }
}

impl std::str::FromStr for WorldMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cooperative" => Ok(WorldMode::Cooperative),
            "competitive" => Ok(WorldMode::Competitive),
            "survival" => Ok(WorldMode::Survival),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WorldRepr")]
pub struct World {
    tick: Tick,
    /// Insertion order, never reordered
    agents: Vec<Agent>,
    resources: Vec<Resource>,
    messages: Vec<Message>,
    pub width: f64,
    pub height: f64,
    mode: WorldMode,
    is_paused: bool,
    speed: f64,
    #[serde(skip)]
    agent_index: AHashMap<AgentId, usize>,
}

/// Wire shape of a world, used to rebuild the agent index on deserialize
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorldRepr {
    tick: Tick,
    agents: Vec<Agent>,
    resources: Vec<Resource>,
    messages: Vec<Message>,
    width: f64,
    height: f64,
    mode: WorldMode,
    #[serde(default)]
    is_paused: bool,
    #[serde(default = "default_speed")]
    speed: f64,
}

fn default_speed() -> f64 {
    1.0
}

impl From<WorldRepr> for World {
    fn from(repr: WorldRepr) -> Self {
        let agent_index = repr
            .agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        Self {
            tick: repr.tick,
            agents: repr.agents,
            resources: repr.resources,
            messages: repr.messages,
            width: repr.width,
            height: repr.height,
            mode: repr.mode,
            is_paused: repr.is_paused,
            speed: repr.speed,
            agent_index,
        }
    }
}

impl World {
    pub fn new(width: f64, height: f64, mode: WorldMode) -> Self {
        Self {
            tick: 0,
            agents: Vec::new(),
            resources: Vec::new(),
            messages: Vec::new(),
            width,
            height,
            mode,
            is_paused: false,
            speed: default_speed(),
            agent_index: AHashMap::new(),
        }
    }

    /// Add an agent; returns false if the id is already taken
    pub fn add_agent(&mut self, agent: Agent) -> bool {
        if self.agent_index.contains_key(&agent.id) {
            tracing::warn!(agent = %agent.id, "duplicate agent id ignored");
            return false;
        }
        self.agent_index.insert(agent.id.clone(), self.agents.len());
        self.agents.push(agent);
        true
    }

    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }

    pub fn mode(&self) -> WorldMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: WorldMode) {
        self.mode = mode;
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.is_paused = paused;
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Callers validate; the world only guards against impossible values
    pub fn set_speed(&mut self, speed: f64) {
        debug_assert!(speed.is_finite() && speed >= 0.0, "invalid speed {speed}");
        self.speed = speed;
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn agent_index(&self, id: &AgentId) -> Option<usize> {
        self.agent_index.get(id).copied()
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agent_index(id).map(|i| &self.agents[i])
    }

    /// Direct access for world setup; simulation code mutates through
    /// `simulation::intent` and `simulation::tick`
    pub fn agent_mut(&mut self, id: &AgentId) -> Option<&mut Agent> {
        let i = self.agent_index(id)?;
        Some(&mut self.agents[i])
    }

    pub fn resources_mut(&mut self) -> &mut [Resource] {
        &mut self.resources
    }

    /// Two distinct agents borrowed mutably at once
    ///
    /// Returns `None` if either id is unknown or both name the same agent.
    pub(crate) fn agent_pair_mut(
        &mut self,
        first: &AgentId,
        second: &AgentId,
    ) -> Option<(&mut Agent, &mut Agent)> {
        let i = self.agent_index(first)?;
        let j = self.agent_index(second)?;
        if i == j {
            return None;
        }
        if i < j {
            let (left, right) = self.agents.split_at_mut(j);
            Some((&mut left[i], &mut right[0]))
        } else {
            let (left, right) = self.agents.split_at_mut(i);
            Some((&mut right[0], &mut left[j]))
        }
    }

    /// Agents and resources borrowed together for the per-agent tick pass
    pub(crate) fn agents_and_resources_mut(&mut self) -> (&mut [Agent], &mut [Resource]) {
        (&mut self.agents, &mut self.resources)
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }
}

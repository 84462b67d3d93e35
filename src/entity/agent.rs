//! Agents: the autonomous actors of the society

use crate::core::types::{AgentId, Millis, Vec2};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// Energy every agent starts with
pub const STARTING_ENERGY: f64 = 100.0;

/// Faction an agent belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Red,
    Blue,
    Green,
    Yellow,
    Neutral,
}

impl Faction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Faction::Red => "red",
            Faction::Blue => "blue",
            Faction::Green => "green",
            Faction::Yellow => "yellow",
            Faction::Neutral => "neutral",
        }
    }
}

/// Animation state shown by observers
///
/// Set by intent application only; nothing resets `Conflict` or
/// `AllyFormed` except the next intent for the same agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimState {
    #[default]
    Idle,
    Thinking,
    Conflict,
    AllyFormed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub faction: Faction,

    pub position: Vec2,
    pub velocity: Vec2,
    /// Where the agent is heading; `None` when standing still
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_pos: Option<Vec2>,

    /// Never negative, no upper bound
    pub energy: f64,

    /// Missing entries count as zero
    #[serde(default)]
    pub trust_scores: AHashMap<AgentId, i32>,
    /// One-directional: listing someone does not make them list you back
    #[serde(default)]
    pub alliances: AHashSet<AgentId>,

    /// Decision layer's self-reported confidence, 0.0 - 1.0
    pub confidence: f64,
    pub state_anim: AnimState,
    /// Ticks of conflict cooldown left; 0 means free to act
    #[serde(default)]
    pub conflict_wait: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_thoughts: Option<String>,
    /// Wall-clock instant after which `last_thoughts` is cleared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_bubble_until: Option<Millis>,

    /// Opaque label of the model driving this agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>, faction: Faction, position: Vec2) -> Self {
        Self {
            id,
            name: name.into(),
            faction,
            position,
            velocity: Vec2::ZERO,
            target_pos: None,
            energy: STARTING_ENERGY,
            trust_scores: AHashMap::new(),
            alliances: AHashSet::new(),
            confidence: 1.0,
            state_anim: AnimState::Idle,
            conflict_wait: 0,
            last_message: None,
            last_thoughts: None,
            thought_bubble_until: None,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy.max(0.0);
        self
    }

    /// Trust this agent holds toward `other`
    pub fn trust_toward(&self, other: &AgentId) -> i32 {
        self.trust_scores.get(other).copied().unwrap_or(0)
    }

    pub fn adjust_trust(&mut self, other: &AgentId, delta: i32) {
        *self.trust_scores.entry(other.clone()).or_insert(0) += delta;
    }

    pub fn is_allied_with(&self, other: &AgentId) -> bool {
        self.alliances.contains(other)
    }

    pub fn in_cooldown(&self) -> bool {
        self.conflict_wait > 0
    }

    /// Drop the thought bubble once its wall-clock deadline has passed
    pub fn expire_thought(&mut self, now: Millis) {
        if let Some(until) = self.thought_bubble_until {
            if now > until {
                self.thought_bubble_until = None;
                self.last_thoughts = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        Agent::new(AgentId::new("agent_0"), "Agent 0", Faction::Red, Vec2::new(10.0, 10.0))
    }

    #[test]
    fn test_new_agent_defaults() {
        let a = agent();
        assert_eq!(a.energy, 100.0);
        assert_eq!(a.confidence, 1.0);
        assert!(a.trust_scores.is_empty());
        assert!(a.alliances.is_empty());
        assert_eq!(a.state_anim, AnimState::Idle);
        assert_eq!(a.conflict_wait, 0);
        assert!(a.target_pos.is_none());
    }

    #[test]
    fn test_unset_trust_is_zero() {
        let a = agent();
        assert_eq!(a.trust_toward(&AgentId::new("nobody")), 0);
    }

    #[test]
    fn test_adjust_trust_accumulates() {
        let mut a = agent();
        let other = AgentId::new("agent_1");
        a.adjust_trust(&other, 1);
        a.adjust_trust(&other, -5);
        assert_eq!(a.trust_toward(&other), -4);
    }

    #[test]
    fn test_thought_expires_only_after_deadline() {
        let mut a = agent();
        a.last_thoughts = Some("hmm".into());
        a.thought_bubble_until = Some(1_000);

        a.expire_thought(1_000);
        assert!(a.last_thoughts.is_some());

        a.expire_thought(1_001);
        assert!(a.last_thoughts.is_none());
        assert!(a.thought_bubble_until.is_none());
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let mut a = agent();
        a.state_anim = AnimState::AllyFormed;
        a.target_pos = Some(Vec2::new(1.0, 2.0));
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["stateAnim"], "ally_formed");
        assert_eq!(json["faction"], "red");
        assert_eq!(json["targetPos"]["x"], 1.0);
        assert_eq!(json["conflictWait"], 0);
        assert!(json.get("lastThoughts").is_none());
    }
}

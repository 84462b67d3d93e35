//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every section can be overridden
//! from a TOML file; missing keys fall back to the defaults below.

use crate::core::error::{Result, SocietyError};
use crate::entity::agent::Faction;
use crate::world::WorldMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration for the server and the agent runner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocietyConfig {
    pub simulation: SimulationConfig,
    pub world: WorldInit,
    pub clock: ClockConfig,
    pub server: ServerConfig,
    pub agents: AgentRunnerConfig,
}

impl SocietyConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SocietyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.world.validate()?;
        self.clock.validate()?;
        self.agents.validate()?;
        if self.server.broadcast_capacity == 0 {
            return Err(SocietyError::InvalidConfig(
                "server.broadcast_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Rules of the simulation itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === MOVEMENT ===
    /// Distance an agent covers per tick while heading to its target
    ///
    /// At 60 ticks per second this is 30 world units per second, so crossing
    /// the default 800-wide world takes a little under half a minute.
    pub agent_speed: f64,

    /// Clamp move targets into the world rectangle
    pub clamp_to_bounds: bool,

    // === INTERACTION ===
    /// Maximum distance (exclusive) for trade and attack
    pub interaction_range: f64,

    /// Energy moved from target to attacker by one attack
    ///
    /// The attacker always gains the full amount even when the target has
    /// less left, so attacks create energy.
    pub attack_energy: f64,

    /// Ticks both parties spend frozen after an attack
    pub conflict_cooldown_ticks: u32,

    /// Trust change applied to both parties of a trade
    pub trade_trust_delta: i32,

    /// Trust change applied to both parties of an attack
    pub attack_trust_delta: i32,

    /// How long a thought stays visible above an agent (milliseconds)
    pub thought_bubble_ms: u64,

    // === UPKEEP ===
    /// Energy is charged every this many ticks
    pub upkeep_interval_ticks: u64,

    /// Energy charged per upkeep, floored at zero
    pub upkeep_cost: f64,

    // === RESOURCES ===
    /// Maximum distance (exclusive) at which agents collect from a resource
    pub collection_radius: f64,

    /// Units taken from each in-range resource per tick
    pub collection_amount: f64,

    /// Per-tick chance that a depleted resource regrows
    ///
    /// At 0.01 and 60 ticks per second a resource regains roughly 36 units
    /// per minute.
    pub respawn_chance: f64,

    /// Units regrown on a successful respawn roll
    pub respawn_amount: f64,

    // === MESSAGES ===
    /// Delivered messages older than this are purged (milliseconds)
    pub message_retention_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agent_speed: 0.5,
            clamp_to_bounds: true,

            interaction_range: 50.0,
            attack_energy: 10.0,
            conflict_cooldown_ticks: 10,
            trade_trust_delta: 1,
            attack_trust_delta: -5,
            thought_bubble_ms: 6_000,

            upkeep_interval_ticks: 60,
            upkeep_cost: 1.0,

            collection_radius: 20.0,
            collection_amount: 1.0,
            respawn_chance: 0.01,
            respawn_amount: 1.0,

            message_retention_ms: 1_000,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !(self.agent_speed > 0.0) || !self.agent_speed.is_finite() {
            return Err(SocietyError::InvalidConfig(format!(
                "agent_speed ({}) must be positive",
                self.agent_speed
            )));
        }
        // NaN fails every comparison, so test for the accepted range
        let distances = [
            ("interaction_range", self.interaction_range),
            ("collection_radius", self.collection_radius),
        ];
        for (name, value) in distances {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(SocietyError::InvalidConfig(format!(
                    "{name} ({value}) must be a non-negative number"
                )));
            }
        }
        if self.upkeep_interval_ticks == 0 {
            return Err(SocietyError::InvalidConfig(
                "upkeep_interval_ticks must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.respawn_chance) {
            return Err(SocietyError::InvalidConfig(format!(
                "respawn_chance ({}) must be within [0, 1]",
                self.respawn_chance
            )));
        }
        let amounts = [
            ("attack_energy", self.attack_energy),
            ("upkeep_cost", self.upkeep_cost),
            ("collection_amount", self.collection_amount),
            ("respawn_amount", self.respawn_amount),
        ];
        for (name, value) in amounts {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(SocietyError::InvalidConfig(format!(
                    "{name} ({value}) must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Parameters for the initial population, supplied once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldInit {
    pub width: f64,
    pub height: f64,
    pub mode: WorldMode,
    /// Seed for placement, respawn and message ids; `None` draws from the OS
    pub seed: Option<u64>,

    pub agent_count: usize,
    /// Agents are placed at least this far from every edge
    pub placement_margin: f64,
    pub starting_energy: f64,
    /// Factions handed out round-robin
    pub factions: Vec<Faction>,
    /// Model labels handed out round-robin
    pub models: Vec<String>,

    pub resource_count: usize,
    pub resource_amount: f64,
    pub resource_max_amount: f64,
}

impl Default for WorldInit {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            mode: WorldMode::Cooperative,
            seed: None,
            agent_count: 15,
            placement_margin: 50.0,
            starting_energy: 100.0,
            factions: vec![Faction::Red, Faction::Blue, Faction::Green],
            models: vec!["llama3.2:latest".to_string()],
            resource_count: 5,
            resource_amount: 50.0,
            resource_max_amount: 100.0,
        }
    }
}

impl WorldInit {
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0) || !(self.height > 0.0) {
            return Err(SocietyError::InvalidConfig("world dimensions must be positive".into()));
        }
        if self.placement_margin < 0.0
            || self.placement_margin * 2.0 >= self.width
            || self.placement_margin * 2.0 >= self.height
        {
            return Err(SocietyError::InvalidConfig(format!(
                "placement_margin ({}) leaves no room inside {}x{}",
                self.placement_margin, self.width, self.height
            )));
        }
        if self.factions.is_empty() {
            return Err(SocietyError::InvalidConfig("at least one faction is required".into()));
        }
        if self.resource_amount < 0.0 || self.resource_amount > self.resource_max_amount {
            return Err(SocietyError::InvalidConfig(format!(
                "resource_amount ({}) must be within [0, {}]",
                self.resource_amount, self.resource_max_amount
            )));
        }
        Ok(())
    }
}

/// Fastest supported cadence; tokio timers resolve to milliseconds
pub const MAX_CADENCE_HZ: f64 = 1_000.0;

/// Cadence of the simulation clock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Cadence intervals per second
    pub cadence_hz: f64,

    /// Upper bound on catch-up ticks fired in a single interval
    ///
    /// At speed 10 the clock fires 10 ticks per interval; anything that
    /// would exceed this bound is dropped instead of queued.
    pub max_ticks_per_interval: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            cadence_hz: 60.0,
            max_ticks_per_interval: 600,
        }
    }
}

impl ClockConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.cadence_hz)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cadence_hz > 0.0) || self.cadence_hz > MAX_CADENCE_HZ {
            return Err(SocietyError::InvalidConfig(format!(
                "cadence_hz ({}) must be within (0, {}]",
                self.cadence_hz, MAX_CADENCE_HZ
            )));
        }
        if self.max_ticks_per_interval == 0 {
            return Err(SocietyError::InvalidConfig(
                "max_ticks_per_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// WebSocket gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Snapshots buffered per observer before the slowest one starts skipping
    pub broadcast_capacity: usize,
    /// Ask Ollama for installed models at startup
    pub discover_models: bool,
    pub ollama_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            broadcast_capacity: 16,
            discover_models: false,
            ollama_url: "http://localhost:11434".to_string(),
        }
    }
}

/// Settings for the reference decision layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentRunnerConfig {
    /// Gateway WebSocket URL
    pub engine_url: String,
    /// LLM endpoint; Ollama `/api/generate` unless it looks OpenAI-compatible
    pub llm_url: String,
    /// Used when the agent carries no model label
    pub default_model: String,
    /// Read from this environment variable for OpenAI-compatible endpoints
    pub api_key_env: String,
    pub decision_period_ms: u64,
    /// Chance that a given agent decides during one pass
    pub decision_probability: f64,
    pub request_timeout_secs: u64,
    /// Models whose name contains any of these are not handed to agents
    pub exclude_models: Vec<String>,
}

impl Default for AgentRunnerConfig {
    fn default() -> Self {
        Self {
            engine_url: "ws://127.0.0.1:3001".to_string(),
            llm_url: "http://localhost:11434/api/generate".to_string(),
            default_model: "llama3.2:latest".to_string(),
            api_key_env: "LLM_API_KEY".to_string(),
            decision_period_ms: 1_000,
            decision_probability: 0.2,
            request_timeout_secs: 60,
            exclude_models: vec!["embed".to_string(), "qwen".to_string()],
        }
    }
}

impl AgentRunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.decision_probability) {
            return Err(SocietyError::InvalidConfig(format!(
                "decision_probability ({}) must be within [0, 1]",
                self.decision_probability
            )));
        }
        if self.decision_period_ms == 0 {
            return Err(SocietyError::InvalidConfig(
                "decision_period_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

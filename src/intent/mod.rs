//! Intent schema accepted from the decision layer
//!
//! An intent is one agent's declared action for the next moment. Decoding is
//! strict about the envelope (action and confidence must be present) and
//! lenient about everything inside it: odd targets and unknown actions decode
//! fine and are ignored by the intent processor.

use crate::core::error::{Result, SocietyError};
use crate::core::types::{AgentId, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of action an intent asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Idle,
    Move,
    Trade,
    Attack,
    Ally,
    /// Anything else, e.g. `request`; treated like `idle`
    #[serde(other)]
    Unrecognized,
}

/// What an action points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntentTarget {
    Position { x: f64, y: f64 },
    Agent { id: AgentId },
    /// Carried through so a bad target never rejects the whole intent
    Other(Value),
}

impl IntentTarget {
    pub fn position(&self) -> Option<Vec2> {
        match self {
            IntentTarget::Position { x, y } => Some(Vec2::new(*x, *y)),
            _ => None,
        }
    }

    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            IntentTarget::Agent { id } => Some(id),
            _ => None,
        }
    }
}

/// Optional message riding along with any action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub receiver_id: AgentId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<IntentTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessagePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    /// Older decision layers nest the thought here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_state_update: Option<Map<String, Value>>,
    pub confidence: f64,
}

impl Intent {
    pub fn new(action: ActionKind, confidence: f64) -> Self {
        Self {
            action,
            target: None,
            message: None,
            thought: None,
            internal_state_update: None,
            confidence,
        }
    }

    pub fn idle(confidence: f64) -> Self {
        Self::new(ActionKind::Idle, confidence)
    }

    pub fn move_to(position: Vec2, confidence: f64) -> Self {
        Self::new(ActionKind::Move, confidence).with_target(IntentTarget::Position {
            x: position.x,
            y: position.y,
        })
    }

    pub fn toward(action: ActionKind, agent: AgentId, confidence: f64) -> Self {
        Self::new(action, confidence).with_target(IntentTarget::Agent { id: agent })
    }

    pub fn with_target(mut self, target: IntentTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = Some(thought.into());
        self
    }

    pub fn with_message(mut self, receiver: AgentId, content: impl Into<String>) -> Self {
        self.message = Some(MessagePayload {
            receiver_id: receiver,
            content: content.into(),
        });
        self
    }

    /// The thought, top-level first, then `internal_state_update.thought`
    pub fn thought(&self) -> Option<&str> {
        self.thought.as_deref().or_else(|| {
            self.internal_state_update
                .as_ref()
                .and_then(|m| m.get("thought"))
                .and_then(Value::as_str)
        })
    }

    pub fn target_position(&self) -> Option<Vec2> {
        self.target.as_ref().and_then(IntentTarget::position)
    }

    pub fn target_agent(&self) -> Option<&AgentId> {
        self.target.as_ref().and_then(IntentTarget::agent_id)
    }
}

/// An intent addressed to a specific agent, as received from the wire
#[derive(Debug, Clone, PartialEq)]
pub struct IntentSubmission {
    pub agent_id: AgentId,
    pub intent: Intent,
}

impl IntentSubmission {
    /// Validate a raw `{agentId, intent}` pair
    ///
    /// Missing or empty fields and intents that do not match the schema are
    /// rejected here so they never reach the engine.
    pub fn from_parts(agent_id: Option<String>, intent: Option<Value>) -> Result<Self> {
        let (agent_id, intent) = match (agent_id, intent) {
            (Some(id), Some(intent)) if !id.is_empty() && !intent.is_null() => (id, intent),
            _ => {
                return Err(SocietyError::MalformedRequest(
                    "missing agentId or intent".into(),
                ))
            }
        };
        let intent: Intent = serde_json::from_value(intent)
            .map_err(|e| SocietyError::MalformedRequest(format!("invalid intent: {e}")))?;
        Ok(Self {
            agent_id: AgentId(agent_id),
            intent,
        })
    }
}

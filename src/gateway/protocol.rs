//! Wire protocol between the gateway and its clients
//!
//! JSON text frames tagged by `type`. Observers (visualization) and the
//! decision layer share one protocol: both receive `world_state` broadcasts,
//! the decision layer additionally submits intents, the visualization sends
//! control requests.

use crate::core::error::{Result, SocietyError};
use crate::core::types::AgentId;
use crate::intent::Intent;
use crate::world::{World, WorldMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Requests accepted from clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Both fields are optional here so their absence can be reported
    /// as a client error instead of a generic decode failure
    SubmitIntent {
        #[serde(rename = "agentId", default, skip_serializing_if = "Option::is_none")]
        agent_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intent: Option<Value>,
    },
    GetState,
    SetMode {
        mode: WorldMode,
    },
    SetPaused {
        paused: bool,
    },
    SetSpeed {
        speed: f64,
    },
    Step,
}

impl ClientMessage {
    pub fn submit(agent_id: &AgentId, intent: &Intent) -> Result<Self> {
        Ok(ClientMessage::SubmitIntent {
            agent_id: Some(agent_id.0.clone()),
            intent: Some(serde_json::to_value(intent)?),
        })
    }

    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frames sent to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    WorldState {
        state: World,
    },
    IntentAck {
        #[serde(rename = "agentId")]
        agent_id: AgentId,
        status: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn ack(agent_id: AgentId) -> Self {
        ServerMessage::IntentAck {
            agent_id,
            status: "ok".to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decode a client frame; failures become client errors
pub fn decode_client_message(text: &str) -> Result<ClientMessage> {
    serde_json::from_str(text)
        .map_err(|e| SocietyError::MalformedRequest(format!("unrecognized request: {e}")))
}

/// Wrap an already serialized world into a `world_state` frame
///
/// Snapshots are serialized once per cadence interval and shared by all
/// observers, so the envelope is spliced around the JSON text.
pub fn world_state_frame(snapshot: &str) -> String {
    format!(r#"{{"type":"world_state","state":{snapshot}}}"#)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_submit_intent() {
        let msg = decode_client_message(
            r#"{"type":"submit_intent","agentId":"agent_1","intent":{"action":"idle","confidence":0.5}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::SubmitIntent { agent_id, intent } => {
                assert_eq!(agent_id.as_deref(), Some("agent_1"));
                assert_eq!(intent.unwrap()["action"], "idle");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_submit_intent_missing_fields_still_decodes() {
        let msg = decode_client_message(r#"{"type":"submit_intent"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::SubmitIntent {
                agent_id: None,
                intent: None
            }
        );
    }

    #[test]
    fn test_decode_controls() {
        assert_eq!(
            decode_client_message(r#"{"type":"set_mode","mode":"competitive"}"#).unwrap(),
            ClientMessage::SetMode {
                mode: WorldMode::Competitive
            }
        );
        assert_eq!(
            decode_client_message(r#"{"type":"set_speed","speed":0.25}"#).unwrap(),
            ClientMessage::SetSpeed { speed: 0.25 }
        );
        assert_eq!(
            decode_client_message(r#"{"type":"step"}"#).unwrap(),
            ClientMessage::Step
        );
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let err = decode_client_message(r#"{"type":"teleport"}"#).unwrap_err();
        assert!(matches!(err, SocietyError::MalformedRequest(_)));
        assert!(decode_client_message("not json").is_err());
    }

    #[test]
    fn test_world_state_frame_parses_back() {
        let world = World::new(800.0, 600.0, WorldMode::Survival);
        let frame = world_state_frame(&serde_json::to_string(&world).unwrap());
        match serde_json::from_str::<ServerMessage>(&frame).unwrap() {
            ServerMessage::WorldState { state } => {
                assert_eq!(state.mode(), WorldMode::Survival);
                assert_eq!(state.width, 800.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ack_shape() {
        let frame = ServerMessage::ack(AgentId::new("agent_2")).to_frame().unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({"type": "intent_ack", "agentId": "agent_2", "status": "ok"})
        );
    }
}

//! Turn free-form model output into intents
//!
//! Models wrap their JSON in prose or markdown fences, drop fields, or
//! answer with nothing useful at all. Parsing is lenient about the former;
//! the latter ends in the fallback intent so every asked agent still acts.

use crate::core::error::{Result, SocietyError};
use crate::core::types::Vec2;
use crate::intent::{ActionKind, Intent, IntentTarget, MessagePayload};
use crate::llm::client::LlmClient;
use crate::llm::context::AgentContext;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;

/// Confidence assumed when the model omits it
pub const DEFAULT_CONFIDENCE: f64 = 0.5;
/// Confidence of the fallback intent
pub const FALLBACK_CONFIDENCE: f64 = 0.1;
pub const FALLBACK_THOUGHT: &str = "Fallback logic activated.";
/// Distance from the world edge kept by fallback destinations
const FALLBACK_MARGIN: f64 = 50.0;

/// A model's answer, every field optional
#[derive(Debug, Default, Deserialize)]
pub struct DecisionResponse {
    #[serde(default)]
    pub action: Option<ActionKind>,
    #[serde(default)]
    pub target: Option<IntentTarget>,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub thought: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl DecisionResponse {
    pub fn into_intent(self) -> Intent {
        let confidence = self
            .confidence
            .filter(|c| c.is_finite() && *c > 0.0)
            .unwrap_or(DEFAULT_CONFIDENCE);
        let mut intent = Intent::new(self.action.unwrap_or(ActionKind::Idle), confidence);
        intent.target = self.target;
        // A malformed message is dropped, the action still goes through
        intent.message = self
            .message
            .and_then(|m| serde_json::from_value::<MessagePayload>(m).ok());
        intent.thought = Some(
            self.thought
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "thinking...".to_string()),
        );
        intent
    }
}

/// Ask the model for one agent's next intent
pub async fn decide(client: &LlmClient, model: &str, context: &AgentContext) -> Result<Intent> {
    let response = client
        .complete(model, &context.system_prompt(), &context.user_prompt())
        .await?;
    parse_decision(&response)
}

/// Parse raw model output into an intent
pub fn parse_decision(response: &str) -> Result<Intent> {
    let json_str = extract_json(response)?;
    let decision: DecisionResponse = serde_json::from_str(json_str).map_err(|e| {
        SocietyError::LlmError(format!(
            "Failed to parse decision: {} - Response: {}",
            e, response
        ))
    })?;
    Ok(decision.into_intent())
}

/// Extract JSON object from LLM response (handles surrounding text)
pub fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| SocietyError::LlmError("No JSON found in response".into()))?;
    let end = response
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| SocietyError::LlmError("No closing brace found in response".into()))?;
    Ok(&response[start..=end])
}

/// Wander to a random point away from the edges
pub fn fallback_intent<R: Rng + ?Sized>(rng: &mut R, width: f64, height: f64) -> Intent {
    let x = sample_axis(rng, width);
    let y = sample_axis(rng, height);
    Intent::move_to(Vec2::new(x, y), FALLBACK_CONFIDENCE).with_thought(FALLBACK_THOUGHT)
}

fn sample_axis<R: Rng + ?Sized>(rng: &mut R, extent: f64) -> f64 {
    if extent > 2.0 * FALLBACK_MARGIN {
        rng.gen_range(FALLBACK_MARGIN..extent - FALLBACK_MARGIN)
    } else if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AgentId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Sure!\n```json\n{\"action\": \"idle\", \"confidence\": 0.9}\n```\nDone.";
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
    }

    #[test]
    fn test_extract_json_no_json() {
        assert!(extract_json("I will wander around").is_err());
        assert!(extract_json("} backwards {").is_err());
    }

    #[test]
    fn test_parse_full_decision() {
        let intent = parse_decision(
            r#"{"action":"attack","target":{"id":"agent_3"},"message":{"receiverId":"agent_3","content":"hi"},"thought":"they are weak","confidence":0.8}"#,
        )
        .unwrap();
        assert_eq!(intent.action, ActionKind::Attack);
        assert_eq!(intent.target_agent(), Some(&AgentId::new("agent_3")));
        assert_eq!(intent.message.as_ref().unwrap().content, "hi");
        assert_eq!(intent.thought(), Some("they are weak"));
        assert_eq!(intent.confidence, 0.8);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let intent = parse_decision("{}").unwrap();
        assert_eq!(intent.action, ActionKind::Idle);
        assert_eq!(intent.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(intent.thought(), Some("thinking..."));
    }

    #[test]
    fn test_bad_message_is_dropped() {
        let intent =
            parse_decision(r#"{"action":"move","target":{"x":1,"y":2},"message":"hello all"}"#)
                .unwrap();
        assert!(intent.message.is_none());
        assert_eq!(intent.target_position(), Some(Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn test_unknown_action_survives_parsing() {
        let intent = parse_decision(r#"{"action":"request","confidence":0.3}"#).unwrap();
        assert_eq!(intent.action, ActionKind::Unrecognized);
    }

    #[test]
    fn test_fallback_stays_inside_margins() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            let intent = fallback_intent(&mut rng, 800.0, 600.0);
            let p = intent.target_position().unwrap();
            assert!((50.0..750.0).contains(&p.x));
            assert!((50.0..550.0).contains(&p.y));
            assert_eq!(intent.confidence, FALLBACK_CONFIDENCE);
            assert_eq!(intent.thought(), Some(FALLBACK_THOUGHT));
        }
    }

    #[test]
    fn test_fallback_in_tiny_world() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let p = fallback_intent(&mut rng, 40.0, 0.0).target_position().unwrap();
        assert!((0.0..40.0).contains(&p.x));
        assert_eq!(p.y, 0.0);
    }
}

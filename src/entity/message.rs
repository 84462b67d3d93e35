//! Messages exchanged between agents

use crate::core::types::{AgentId, MessageId, Millis};
use serde::{Deserialize, Serialize};

/// A message in flight
///
/// Created undelivered, marked delivered by the next tick, and purged once
/// delivered and older than the retention window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: AgentId,
    pub receiver_id: AgentId,
    pub content: String,
    /// Creation instant
    pub timestamp: Millis,
    pub delivered: bool,
}

impl Message {
    pub fn new(
        id: MessageId,
        sender_id: AgentId,
        receiver_id: AgentId,
        content: impl Into<String>,
        timestamp: Millis,
    ) -> Self {
        Self {
            id,
            sender_id,
            receiver_id,
            content: content.into(),
            timestamp,
            delivered: false,
        }
    }

    pub fn age(&self, now: Millis) -> Millis {
        now.saturating_sub(self.timestamp)
    }

    /// Delivered and at least `retention` old
    pub fn is_expired(&self, now: Millis, retention: Millis) -> bool {
        self.delivered && self.age(now) >= retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(timestamp: Millis) -> Message {
        Message::new(
            MessageId::from_random_bytes([1; 16]),
            AgentId::new("a"),
            AgentId::new("b"),
            "hello",
            timestamp,
        )
    }

    #[test]
    fn test_undelivered_never_expires() {
        let m = message(0);
        assert!(!m.is_expired(1_000_000, 1_000));
    }

    #[test]
    fn test_delivered_expires_at_retention() {
        let mut m = message(5_000);
        m.delivered = true;
        assert!(!m.is_expired(5_999, 1_000));
        assert!(m.is_expired(6_000, 1_000));
    }

    #[test]
    fn test_age_saturates_when_clock_behind() {
        let m = message(5_000);
        assert_eq!(m.age(4_000), 0);
    }
}

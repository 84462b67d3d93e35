//! Reference decision layer
//!
//! Lives outside the engine and reaches it only through the gateway
//! protocol. Any other policy process producing intents works the same.

pub mod client;
pub mod context;
pub mod parser;

pub use client::{list_models, LlmClient};
pub use context::AgentContext;
pub use parser::{decide, fallback_intent, parse_decision};

//! Entity records: agents, resources and messages
//!
//! Plain data plus the invariants established at construction. All
//! mutation during a run goes through the intent processor and the tick
//! engine in `simulation`.

pub mod agent;
pub mod message;
pub mod resource;

pub use agent::{Agent, AnimState, Faction};
pub use message::Message;
pub use resource::Resource;

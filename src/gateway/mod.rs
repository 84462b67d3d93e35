//! State gateway - the engine's only network surface

pub mod protocol;
pub mod server;

pub use protocol::{decode_client_message, world_state_frame, ClientMessage, ServerMessage};
pub use server::{run_gateway, run_server, Dispatch, Gateway};

pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use error::{Result, SocietyError};

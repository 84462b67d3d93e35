use thiserror::Error;

#[derive(Error, Debug)]
pub enum SocietyError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Simulation lock poisoned")]
    Poisoned,

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SocietyError>;

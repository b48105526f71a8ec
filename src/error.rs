use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Mission not found: {0}")]
    MissionNotFound(String),

    #[error("Mission already exists: {0}")]
    MissionAlreadyExists(String),

    #[error("Mission {0} is already running")]
    MissionAlreadyRunning(String),

    #[error("Empty prompt for mission: {0}")]
    EmptyPrompt(String),

    #[error("Invalid mission state: expected {expected}, got {actual}")]
    InvalidMissionState { expected: String, actual: String },

    #[error("Invalid state transition: {from} -> {to} (allowed: {allowed})")]
    InvalidStateTransition {
        from: String,
        to: String,
        allowed: String,
    },

    #[error("Stage execution failed: {0}")]
    StageExecution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ControlError>;

use std::path::PathBuf;

/// Contract violations raised by the decision policy; never retried.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("no legal actions were offered for this turn")]
    NoLegalActions,

    #[error("switch target {slot} is not a legal reserve: {reason}")]
    IllegalSwitchTarget { slot: usize, reason: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

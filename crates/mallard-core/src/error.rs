use thiserror::Error;

/// Errors produced by the conversation core.
#[derive(Debug, Error)]
pub enum MallardError {
    /// A caller broke an API precondition (empty message text, empty phrase
    /// table, inconsistent latency bounds).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MallardError>;

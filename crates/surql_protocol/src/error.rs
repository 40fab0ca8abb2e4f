//! Protocol error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unsupported query mode '{0}'")]
    UnsupportedQueryMode(String),

    #[error("unsupported rate function '{0}'")]
    UnsupportedRateFunction(String),

    #[error("invalid interval '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("query request must carry at least one target")]
    EmptyTargets,

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

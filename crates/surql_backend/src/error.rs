//! Backend error types

use chrono::{DateTime, Utc};
use surql_protocol::ProtocolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Connection or RPC failure reported by the SurrealDB client
    #[error("{0}")]
    Client(String),

    #[error("invalid queryResponse {0}")]
    InvalidResponse(&'static str),

    /// A statement finished with status `ERR`
    #[error("{0}")]
    Statement(String),

    #[error("not supported query result type '{0}'")]
    UnsupportedResult(&'static str),

    #[error("multiple frames are not supported yet")]
    MultipleFrames,

    #[error("{role} '{name}' not found in data frame, available are: {available}")]
    MissingField {
        role: &'static str,
        name: String,
        available: String,
    },

    #[error("rate interval must be positive")]
    NonPositiveInterval,

    #[error("rate window bound {0} is outside the supported time range")]
    WindowOutOfRange(DateTime<Utc>),

    #[error("rate would produce {count} buckets, more than the {max} allowed")]
    TooManyBuckets { count: i64, max: i64 },
}

/// Processing stage a per-query error is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Json,
    Mode,
    Query,
    Result,
    Metric,
    Group,
    Rate,
}

impl QueryStage {
    pub fn label(&self) -> &'static str {
        match self {
            QueryStage::Json => "Query json",
            QueryStage::Mode => "Query mode",
            QueryStage::Query => "Query failed",
            QueryStage::Result => "Result failed",
            QueryStage::Metric => "Metric failed",
            QueryStage::Group => "Group failed",
            QueryStage::Rate => "Rate failed",
        }
    }

    /// User-facing message for `err` raised in this stage.
    pub fn message(&self, err: &BackendError) -> String {
        format!("{}: {}", self.label(), err)
    }
}

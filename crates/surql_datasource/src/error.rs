//! Datasource error types

use thiserror::Error;

/// Stream-level failure reported by the transport before completion.
///
/// Displays as the underlying message so callers can prefix it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

//! The SurrealDB connection seam and statement-result parsing.

use crate::error::{BackendError, Result};
use serde_json::Value;
use std::future::Future;
use std::sync::Mutex;

/// Executes SurrealQL against a database session.
///
/// Resolves to the raw RPC result: an array with one
/// `{status, time, result}` object per statement.
pub trait SurrealClient: Send + Sync {
    fn query(&self, surql: &str) -> impl Future<Output = Result<Value>> + Send;
}

/// First statement of a query response.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementResult {
    pub status: String,
    pub time: String,
    pub result: Value,
}

impl StatementResult {
    /// Parse the first statement out of a raw RPC result.
    ///
    /// A statement with status `ERR` becomes [`BackendError::Statement`].
    pub fn from_response(response: &Value) -> Result<Self> {
        let statements = response
            .as_array()
            .filter(|statements| !statements.is_empty())
            .ok_or(BackendError::InvalidResponse("length"))?;
        let first = statements[0]
            .as_object()
            .ok_or(BackendError::InvalidResponse("array type"))?;
        let status = first
            .get("status")
            .ok_or(BackendError::InvalidResponse("status"))?;
        let time = first
            .get("time")
            .ok_or(BackendError::InvalidResponse("time"))?;
        let result = first
            .get("result")
            .ok_or(BackendError::InvalidResponse("data"))?;

        let status = text_of(status);
        if status == "ERR" {
            return Err(BackendError::Statement(text_of(result)));
        }

        Ok(Self {
            status,
            time: text_of(time),
            result: result.clone(),
        })
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replays one recorded RPC result and remembers the queries it was sent.
#[derive(Debug)]
pub struct RecordedClient {
    response: std::result::Result<Value, String>,
    executed: Mutex<Vec<String>>,
}

impl RecordedClient {
    pub fn new(response: Value) -> Self {
        Self {
            response: Ok(response),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every query fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Wrap a bare `result` value as a single successful statement.
    pub fn with_result(result: Value) -> Self {
        Self::new(serde_json::json!([{ "status": "OK", "time": "1ms", "result": result }]))
    }

    /// Queries received so far, after macro expansion.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }
}

impl SurrealClient for RecordedClient {
    fn query(&self, surql: &str) -> impl Future<Output = Result<Value>> + Send {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(surql.to_string());
        }
        let response = self.response.clone().map_err(BackendError::Client);
        async move { response }
    }
}

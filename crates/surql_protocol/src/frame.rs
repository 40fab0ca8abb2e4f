//! Typed response payloads: tables (frames), their columns and cell values,
//! and the streamed envelope the transport delivers them in.

use crate::types::{LoadingState, VisType};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Cell values
// ============================================================================

/// One cell of a [`Field`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Time(DateTime<Utc>),
    /// Structured value (object or array) kept as-is
    Json(serde_json::Value),
}

impl FieldValue {
    /// Canonical text form of the value. Total: never fails.
    ///
    /// Text is returned verbatim; everything else is rendered as JSON, with
    /// integral numbers printed without a fractional part (`3`, not `3.0`)
    /// and non-finite numbers rendered as `null`.
    pub fn to_display_string(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Null => "null".to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Time(t) => format!("\"{}\"", t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            FieldValue::Json(value) => value.to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Lift an arbitrary JSON value into a cell, keeping scalars typed.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Json(serde_json::Value::Number(n)),
            },
            serde_json::Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Json(other),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Time(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Number text as a JavaScript host prints it: shortest round-trip digits,
/// exponent form from 1e21 and below 1e-6.
fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "null".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{:e}", n);
        return match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => text,
        };
    }
    format!("{}", n)
}

// ============================================================================
// Frames
// ============================================================================

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

impl Field {
    pub fn new(name: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Every cell in canonical text form, in order.
    pub fn display_values(&self) -> Vec<String> {
        self.values.iter().map(FieldValue::to_display_string).collect()
    }
}

/// Custom metadata the backend attaches to every frame of a query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetaCustom {
    /// Query text as submitted
    pub query_raw: String,
    /// Query text after macro expansion
    pub query_run: String,
    pub status: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_visualisation_type: Option<VisType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<QueryMetaCustom>,
}

/// A table: ordered columns of equal length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataFrame {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<FrameMeta>,
}

impl DataFrame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            meta: None,
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Row count (length of the first column).
    pub fn row_count(&self) -> usize {
        self.fields.first().map(Field::len).unwrap_or(0)
    }

    /// Comma-separated field names, used in "available are" diagnostics.
    pub fn field_names(&self) -> String {
        self.fields
            .iter()
            .map(|field| field.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ============================================================================
// Streamed response envelope
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameError {
    pub message: String,
}

/// One element of the response stream for a dispatched request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseFrame {
    #[serde(default)]
    pub state: LoadingState,
    #[serde(default)]
    pub data: Vec<DataFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FrameError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ResponseFrame {
    pub fn loading() -> Self {
        Self {
            state: LoadingState::Loading,
            ..Self::default()
        }
    }

    pub fn done(data: Vec<DataFrame>) -> Self {
        Self {
            state: LoadingState::Done,
            data,
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: LoadingState::Error,
            error: Some(FrameError {
                message: message.into(),
            }),
            ..Self::default()
        }
    }

    /// First field of the first table, if any.
    pub fn first_field(&self) -> Option<&Field> {
        self.data.first().and_then(|frame| frame.fields.first())
    }
}

/// One selectable choice of a dashboard variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricFindValue {
    pub text: String,
}

impl MetricFindValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

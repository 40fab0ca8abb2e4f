//! Query model: the unit of work a panel or variable submits.

use crate::defaults;
use crate::error::{ProtocolError, Result};
use crate::types::{QueryMode, RateFunction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use surql_ids::RequestId;

// ============================================================================
// Identifiable request base
// ============================================================================

/// Fields every host-issued query carries regardless of datasource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    /// Host-assigned key matching a response to its target (`A`, `B`, ...)
    #[serde(default)]
    pub ref_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    /// Opaque datasource reference, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<serde_json::Value>,
}

impl DataQuery {
    pub fn new(ref_id: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            ..Self::default()
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hide.unwrap_or(false)
    }
}

// ============================================================================
// Query
// ============================================================================

/// A SurrealQL query plus its display mode and mode-specific options.
///
/// Optional fields outside the current mode's [`ModeFieldVisibility`] are
/// kept as-is so switching modes back and forth loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(flatten)]
    pub base: DataQuery,
    pub mode: QueryMode,
    #[serde(rename = "surql", default)]
    pub text: String,
    #[serde(rename = "requery", default)]
    pub auto_requery: bool,
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp_field: Option<String>,
    #[serde(rename = "logMessage", default, skip_serializing_if = "Option::is_none")]
    pub log_message_field: Option<String>,
    #[serde(rename = "metricData", default, skip_serializing_if = "Option::is_none")]
    pub metric_value_field: Option<String>,
    #[serde(rename = "group", default, skip_serializing_if = "Option::is_none")]
    pub group_enabled: Option<bool>,
    #[serde(rename = "groupBy", default, skip_serializing_if = "Option::is_none")]
    pub group_by_field: Option<String>,
    #[serde(rename = "rate", default, skip_serializing_if = "Option::is_none")]
    pub rate_enabled: Option<bool>,
    #[serde(rename = "rateZero", default, skip_serializing_if = "Option::is_none")]
    pub rate_zero_fill: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_interval: Option<String>,
    /// Ordered, duplicate-free. `Some(vec![])` is an explicit empty selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_functions: Option<Vec<RateFunction>>,
}

impl Query {
    /// A bare query with every optional field unset.
    pub fn new(ref_id: impl Into<String>, mode: QueryMode, text: impl Into<String>) -> Self {
        Self {
            base: DataQuery::new(ref_id),
            mode,
            text: text.into(),
            auto_requery: false,
            timestamp_field: None,
            log_message_field: None,
            metric_value_field: None,
            group_enabled: None,
            group_by_field: None,
            rate_enabled: None,
            rate_zero_fill: None,
            rate_interval: None,
            rate_functions: None,
        }
    }

    pub fn ref_id(&self) -> &str {
        &self.base.ref_id
    }

    pub fn is_hidden(&self) -> bool {
        self.base.is_hidden()
    }

    pub fn visibility(&self) -> ModeFieldVisibility {
        ModeFieldVisibility::for_mode(self.mode)
    }

    pub fn is_group_enabled(&self) -> bool {
        self.group_enabled.unwrap_or(false)
    }

    pub fn is_rate_enabled(&self) -> bool {
        self.rate_enabled.unwrap_or(false)
    }

    pub fn is_rate_zero_fill(&self) -> bool {
        self.rate_zero_fill.unwrap_or(false)
    }

    pub fn rate_functions(&self) -> &[RateFunction] {
        self.rate_functions.as_deref().unwrap_or(&[])
    }
}

impl Default for Query {
    fn default() -> Self {
        let mut query = Query::new("", QueryMode::default(), defaults::DEFAULT_QUERY_TEXT);
        query.auto_requery = defaults::DEFAULT_AUTO_REQUERY;
        query
    }
}

// ============================================================================
// Mode field visibility
// ============================================================================

/// Optional query fields whose meaning depends on the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionalField {
    TimestampField,
    LogMessageField,
    MetricValueField,
    Group,
    GroupBy,
    RateEnabled,
    RateZeroFill,
    RateInterval,
    RateFunctions,
}

impl OptionalField {
    /// Wire name of the field inside a serialized query.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionalField::TimestampField => "timestamp",
            OptionalField::LogMessageField => "logMessage",
            OptionalField::MetricValueField => "metricData",
            OptionalField::Group => "group",
            OptionalField::GroupBy => "groupBy",
            OptionalField::RateEnabled => "rate",
            OptionalField::RateZeroFill => "rateZero",
            OptionalField::RateInterval => "rateInterval",
            OptionalField::RateFunctions => "rateFunctions",
        }
    }
}

impl fmt::Display for OptionalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const RAW_FIELDS: &[OptionalField] = &[];
const LOG_FIELDS: &[OptionalField] = &[OptionalField::TimestampField, OptionalField::LogMessageField];
const METRIC_FIELDS: &[OptionalField] = &[
    OptionalField::TimestampField,
    OptionalField::MetricValueField,
    OptionalField::Group,
    OptionalField::GroupBy,
    OptionalField::RateEnabled,
    OptionalField::RateZeroFill,
    OptionalField::RateInterval,
    OptionalField::RateFunctions,
];

/// The optional fields that are meaningful for one mode. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeFieldVisibility {
    mode: QueryMode,
    fields: &'static [OptionalField],
}

impl ModeFieldVisibility {
    pub fn for_mode(mode: QueryMode) -> Self {
        let fields = match mode {
            QueryMode::Raw => RAW_FIELDS,
            QueryMode::Log => LOG_FIELDS,
            QueryMode::Metric => METRIC_FIELDS,
        };
        Self { mode, fields }
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn contains(&self, field: OptionalField) -> bool {
        self.fields.contains(&field)
    }

    pub fn fields(&self) -> &'static [OptionalField] {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// Request envelope
// ============================================================================

/// Absolute time window of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Window ending now and spanning `span`.
    pub fn last(span: chrono::Duration) -> Self {
        let to = Utc::now();
        Self { from: to - span, to }
    }
}

/// One scoped template variable binding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopedVar {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl ScopedVar {
    pub fn new(text: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// Variable name (without `$`) to binding.
pub type ScopedVars = BTreeMap<String, ScopedVar>;

/// Outbound envelope. Built fresh per execution and never mutated after dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub request_id: RequestId,
    pub app: String,
    pub timezone: String,
    pub interval: String,
    pub interval_ms: u64,
    pub range: TimeRange,
    /// Dispatch wall-clock time, milliseconds since the epoch
    pub start_time: i64,
    #[serde(default)]
    pub scoped_vars: ScopedVars,
    pub targets: Vec<Query>,
}

impl QueryRequest {
    /// Build a request stamped with the current time.
    ///
    /// Fails with [`ProtocolError::EmptyTargets`] when `targets` is empty.
    pub fn new(
        request_id: RequestId,
        range: TimeRange,
        interval: impl Into<String>,
        interval_ms: u64,
        targets: Vec<Query>,
    ) -> Result<Self> {
        if targets.is_empty() {
            return Err(ProtocolError::EmptyTargets);
        }
        Ok(Self {
            request_id,
            app: defaults::VARIABLE_QUERY_APP.to_string(),
            timezone: defaults::VARIABLE_QUERY_TIMEZONE.to_string(),
            interval: interval.into(),
            interval_ms,
            range,
            start_time: Utc::now().timestamp_millis(),
            scoped_vars: ScopedVars::new(),
            targets,
        })
    }

    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = app.into();
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_scoped_vars(mut self, scoped_vars: ScopedVars) -> Self {
        self.scoped_vars = scoped_vars;
        self
    }

    /// Same envelope with a replacement target list.
    pub fn with_targets(&self, targets: Vec<Query>) -> Result<Self> {
        if targets.is_empty() {
            return Err(ProtocolError::EmptyTargets);
        }
        Ok(Self {
            targets,
            ..self.clone()
        })
    }
}

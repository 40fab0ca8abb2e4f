//! Canonical enums used across the datasource crates.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Query mode
// ============================================================================

/// Display intent of a query. Governs which optional query fields apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Plain table output (default)
    #[default]
    Raw,
    /// Log lines keyed by a timestamp
    Log,
    /// Numeric time series, optionally grouped and rate-aggregated
    Metric,
}

impl QueryMode {
    pub const ALL: [QueryMode; 3] = [QueryMode::Raw, QueryMode::Log, QueryMode::Metric];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Raw => "raw",
            QueryMode::Log => "log",
            QueryMode::Metric => "metric",
        }
    }

    /// Visualization the host should prefer for frames produced in this mode.
    pub fn preferred_visualisation(&self) -> VisType {
        match self {
            QueryMode::Raw => VisType::Table,
            QueryMode::Log => VisType::Logs,
            QueryMode::Metric => VisType::Graph,
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(QueryMode::Raw),
            "log" => Ok(QueryMode::Log),
            "metric" => Ok(QueryMode::Metric),
            _ => Err(ProtocolError::UnsupportedQueryMode(s.to_string())),
        }
    }
}

// ============================================================================
// Rate aggregation functions
// ============================================================================

/// Per-bucket aggregate computed when rate aggregation is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateFunction {
    Count,
    Absence,
    Sum,
    Average,
    Median,
    Quantile25,
    Quantile75,
    Quantile95,
    Quantile99,
    #[serde(rename = "stddev")]
    StdDev,
}

impl RateFunction {
    /// Column order used when rate output frames are assembled.
    pub const OUTPUT_ORDER: [RateFunction; 10] = [
        RateFunction::Count,
        RateFunction::Sum,
        RateFunction::Absence,
        RateFunction::Average,
        RateFunction::Median,
        RateFunction::Quantile25,
        RateFunction::Quantile75,
        RateFunction::Quantile95,
        RateFunction::Quantile99,
        RateFunction::StdDev,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateFunction::Count => "count",
            RateFunction::Absence => "absence",
            RateFunction::Sum => "sum",
            RateFunction::Average => "average",
            RateFunction::Median => "median",
            RateFunction::Quantile25 => "quantile25",
            RateFunction::Quantile75 => "quantile75",
            RateFunction::Quantile95 => "quantile95",
            RateFunction::Quantile99 => "quantile99",
            RateFunction::StdDev => "stddev",
        }
    }

    /// Quantile in `[0, 1]` for the order-statistic functions.
    pub fn quantile(&self) -> Option<f64> {
        match self {
            RateFunction::Median => Some(0.50),
            RateFunction::Quantile25 => Some(0.25),
            RateFunction::Quantile75 => Some(0.75),
            RateFunction::Quantile95 => Some(0.95),
            RateFunction::Quantile99 => Some(0.99),
            _ => None,
        }
    }
}

impl fmt::Display for RateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RateFunction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateFunction::OUTPUT_ORDER
            .iter()
            .copied()
            .find(|function| function.as_str() == s)
            .ok_or_else(|| ProtocolError::UnsupportedRateFunction(s.to_string()))
    }
}

// ============================================================================
// Streamed response state
// ============================================================================

/// State carried by every streamed response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LoadingState {
    NotStarted,
    /// Request dispatched, no data yet (default)
    #[default]
    Loading,
    /// Partial data, more frames follow
    Streaming,
    Done,
    Error,
}

impl LoadingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadingState::NotStarted => "NotStarted",
            LoadingState::Loading => "Loading",
            LoadingState::Streaming => "Streaming",
            LoadingState::Done => "Done",
            LoadingState::Error => "Error",
        }
    }

    /// Terminal frames end a query, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadingState::Done | LoadingState::Error)
    }
}

impl fmt::Display for LoadingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Preferred panel type advertised in frame metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisType {
    Table,
    Logs,
    Graph,
}

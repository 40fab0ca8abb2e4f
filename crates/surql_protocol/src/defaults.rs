//! Canonical default values shared by the front-end core and the backend.

pub const DEFAULT_QUERY_TEXT: &str = "info for database";
pub const DEFAULT_AUTO_REQUERY: bool = true;

pub const VARIABLE_QUERY_APP: &str = "dashboard";
pub const VARIABLE_QUERY_TIMEZONE: &str = "browser";
pub const VARIABLE_QUERY_INTERVAL: &str = "1s";
pub const VARIABLE_QUERY_INTERVAL_MS: u64 = 1000;

/// Scoped variable carrying the dashboard interval as text (e.g. `30s`).
pub const INTERVAL_VAR: &str = "__interval";
/// Scoped variable carrying the dashboard interval in milliseconds.
pub const INTERVAL_MS_VAR: &str = "__interval_ms";
/// Camel-cased spelling some dashboards still bind.
pub const INTERVAL_MS_LEGACY_VAR: &str = "__intervalMs";

pub const DEFAULT_TIMESTAMP_FIELD: &str = "timestamp";
pub const DEFAULT_METRIC_VALUE_FIELD: &str = "value";
pub const DEFAULT_GROUP_BY_FIELD: &str = "group";

pub const DEFAULT_LOCATION: &str = "localhost:8000";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_DATABASE: &str = "default";
pub const DEFAULT_USERNAME: &str = "root";
pub const DEFAULT_PASSWORD: &str = "root";

pub const QUERY_FAILED_PREFIX: &str = "Query failed: ";
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

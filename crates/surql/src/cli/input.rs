//! Argument decoding shared by the subcommands.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use surql_protocol::duration::parse_duration;
use surql_protocol::TimeRange;

/// Decode a JSON argument given inline or as a file path.
pub fn read_json(arg: &str) -> Result<Value> {
    let trimmed = arg.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Failed to parse inline JSON");
    }

    let path = Path::new(arg);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve `--from`/`--to`; missing ends default to the last hour.
pub fn time_range(from: Option<&str>, to: Option<&str>, now: DateTime<Utc>) -> Result<TimeRange> {
    let to = match to {
        Some(text) => parse_time(text).context("Invalid --to")?,
        None => now,
    };
    let from = match from {
        Some(text) => parse_time(text).context("Invalid --from")?,
        None => to - chrono::Duration::hours(1),
    };
    anyhow::ensure!(from <= to, "--from {} is after --to {}", from, to);
    Ok(TimeRange::new(from, to))
}

pub fn interval(text: &str) -> Result<Duration> {
    parse_duration(text).context("Invalid --interval")
}

fn parse_time(text: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(text.trim())
        .with_context(|| format!("'{}' is not an RFC 3339 timestamp", text))?;
    Ok(parsed.with_timezone(&Utc))
}

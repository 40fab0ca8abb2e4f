//! Compact duration text as used inside SurrealQL (`1h30m`, `500ms`).

use crate::error::{ProtocolError, Result};
use std::str::FromStr;
use std::time::Duration;

/// Render a duration with its non-zero units, largest first.
///
/// `Duration::ZERO` renders as `0s`.
pub fn format_compact(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let mut out = String::new();
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let nanos = duration.subsec_nanos();

    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 {
        out.push_str(&format!("{}s", seconds));
    }
    if nanos > 0 {
        if nanos % 1_000_000 == 0 {
            out.push_str(&format!("{}ms", nanos / 1_000_000));
        } else if nanos % 1_000 == 0 {
            out.push_str(&format!("{}us", nanos / 1_000));
        } else {
            out.push_str(&format!("{}ns", nanos));
        }
    }
    out
}

/// Parse duration text such as `1m30s`, `5m` or `250ms`.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let parsed = humantime::Duration::from_str(value.trim()).map_err(|e| {
        ProtocolError::InvalidDuration {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;
    let duration: Duration = *parsed.as_ref();
    if duration.is_zero() {
        return Err(ProtocolError::InvalidDuration {
            value: value.to_string(),
            reason: "duration must be positive".to_string(),
        });
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_compact(Duration::from_secs(3600)), "1h");
        assert_eq!(format_compact(Duration::from_millis(500)), "500ms");
        assert_eq!(format_compact(Duration::from_millis(1500)), "1s500ms");
        assert_eq!(format_compact(Duration::ZERO), "0s");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("0s").is_err());
    }

    #[test]
    fn test_compact_text_parses_back() {
        for secs in [1, 45, 60, 61, 3599, 7200] {
            let d = Duration::from_secs(secs);
            assert_eq!(parse_duration(&format_compact(d)).unwrap(), d);
        }
    }
}

//! Query time window and `$macro` expansion in SurrealQL text.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use std::time::Duration;
use surql_protocol::duration::format_compact;
use surql_protocol::TimeRange;

pub const INTERVAL_MACRO: &str = "$interval";
pub const NOW_MACRO: &str = "$now";
pub const FROM_MACRO: &str = "$from";
pub const TO_MACRO: &str = "$to";

/// Resolved time bounds of one query execution.
///
/// `from` is widened to one nanosecond before its second and `to` to the
/// last nanosecond of its second, so inclusive comparisons against
/// second-precision data cover the whole range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub now: DateTime<Utc>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub interval: Duration,
}

impl QueryWindow {
    pub fn new(range: TimeRange, interval: Duration, now: DateTime<Utc>) -> Self {
        let one_ns = chrono::Duration::nanoseconds(1);
        let from = truncate_to_second(range.from) - one_ns;
        let to = truncate_to_second(range.to) + chrono::Duration::seconds(1) - one_ns;
        Self {
            now,
            from,
            to,
            interval,
        }
    }

    /// Interval as SurrealQL duration text.
    pub fn interval_text(&self) -> String {
        format_compact(self.interval)
    }

    /// Substitute `$interval`, `$now`, `$from` and `$to` in `text`.
    pub fn expand(&self, text: &str) -> String {
        text.replace(INTERVAL_MACRO, &self.interval_text())
            .replace(NOW_MACRO, &quoted(self.now))
            .replace(FROM_MACRO, &quoted(self.from))
            .replace(TO_MACRO, &quoted(self.to))
    }
}

fn truncate_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(0).unwrap_or(t)
}

fn quoted(t: DateTime<Utc>) -> String {
    format!("'{}'", t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> QueryWindow {
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        let to = Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap()
            + chrono::Duration::milliseconds(750);
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 5).unwrap();
        QueryWindow::new(TimeRange::new(from, to), Duration::from_secs(90), now)
    }

    #[test]
    fn test_window_bounds() {
        let w = window();
        assert_eq!(
            w.from.to_rfc3339_opts(SecondsFormat::Nanos, true),
            "2024-03-01T09:59:59.999999999Z"
        );
        assert_eq!(
            w.to.to_rfc3339_opts(SecondsFormat::Nanos, true),
            "2024-03-01T11:00:00.999999999Z"
        );
    }

    #[test]
    fn test_expand_macros() {
        let text = "select math::mean(v) from cpu where time >= $from and time <= $to \
                    group by time::floor(time, $interval) -- $now";
        assert_eq!(
            window().expand(text),
            "select math::mean(v) from cpu where time >= '2024-03-01T09:59:59.999999999Z' \
             and time <= '2024-03-01T11:00:00.999999999Z' \
             group by time::floor(time, 1m30s) -- '2024-03-01T11:00:05Z'"
        );
    }

    #[test]
    fn test_expand_leaves_plain_text() {
        assert_eq!(window().expand("info for database"), "info for database");
    }
}

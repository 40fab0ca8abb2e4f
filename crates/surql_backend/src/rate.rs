//! Rate aggregation: resample a `[time, value]` frame into fixed buckets and
//! compute the selected per-bucket statistics.

use crate::error::{BackendError, Result};
use crate::macros::{QueryWindow, INTERVAL_MACRO};
use crate::options::RateOptions;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;
use surql_protocol::duration::parse_duration;
use surql_protocol::{DataFrame, Field, FieldValue, RateFunction};

/// Upper bound on buckets per frame.
pub const MAX_RATE_BUCKETS: i64 = 100_000;

/// Bucket width: the rate interval (with `$interval` substituted) if set,
/// else the query interval.
pub fn bucket_width(rate: &RateOptions, window: &QueryWindow) -> Result<Duration> {
    let width = match &rate.interval {
        Some(interval) => {
            let interval = interval.replace(INTERVAL_MACRO, &window.interval_text());
            parse_duration(&interval)?
        }
        None => window.interval,
    };
    if width.is_zero() {
        return Err(BackendError::NonPositiveInterval);
    }
    Ok(width)
}

/// Replace the fields of a projected `[time, value, ..]` frame with
/// `[time, <enabled functions>]`, one row per bucket.
///
/// Buckets start at `window.from` and step by the bucket width up to
/// `window.to`. A sample belongs to the first bucket with
/// `start <= t <= start + width`. Empty buckets yield `null`, or `0` with
/// zero fill (absence yields `1`).
pub fn apply(frame: &mut DataFrame, rate: &RateOptions, window: &QueryWindow) -> Result<()> {
    let width = bucket_width(rate, window)?;
    let width_ns = i64::try_from(width.as_nanos()).unwrap_or(i64::MAX);
    let from_ns = window_nanos(window.from)?;
    let to_ns = window_nanos(window.to)?;

    let too_many = |count| BackendError::TooManyBuckets {
        count,
        max: MAX_RATE_BUCKETS,
    };
    let count = to_ns
        .checked_sub(from_ns)
        .map(|span| span / width_ns + 1)
        .ok_or_else(|| too_many(i64::MAX))?;
    if count > MAX_RATE_BUCKETS {
        return Err(too_many(count));
    }

    let time_name = frame
        .fields
        .first()
        .map(|field| field.name.clone())
        .unwrap_or_default();
    let samples = samples(frame);

    let mut starts = Vec::new();
    let mut buckets: Vec<Vec<f64>> = Vec::new();
    let mut counts = Vec::new();
    let mut index = 0;
    let mut current = from_ns;
    while current <= to_ns {
        let end = current.saturating_add(width_ns);
        let mut values = Vec::new();
        let mut seen = 0u64;
        while let Some((t, v)) = samples.get(index) {
            if *t < current {
                index += 1;
                continue;
            }
            if *t > end {
                break;
            }
            seen += 1;
            if let Some(v) = v {
                values.push(*v);
            }
            index += 1;
        }
        starts.push(FieldValue::Time(Utc.timestamp_nanos(current)));
        counts.push(seen);
        buckets.push(values);
        current = match current.checked_add(width_ns) {
            Some(next) => next,
            None => break,
        };
    }

    let zero_fill = rate.zero_fill;
    let mut fields = vec![Field::new(time_name, starts)];
    for function in RateFunction::OUTPUT_ORDER {
        if !rate.functions.contains(&function) {
            continue;
        }
        let values = buckets
            .iter()
            .zip(&counts)
            .map(|(values, seen)| FieldValue::from(aggregate(function, values, *seen, zero_fill)))
            .collect();
        fields.push(Field::new(function.as_str(), values));
    }
    frame.fields = fields;
    Ok(())
}

/// `(time ns, value)` pairs sorted by time; rows without a time are dropped.
fn samples(frame: &DataFrame) -> Vec<(i64, Option<f64>)> {
    let (Some(time), Some(value)) = (frame.fields.first(), frame.fields.get(1)) else {
        return Vec::new();
    };
    let mut samples: Vec<(i64, Option<f64>)> = time
        .values
        .iter()
        .zip(&value.values)
        .filter_map(|(t, v)| {
            let t = t.as_time()?.timestamp_nanos_opt()?;
            Some((t, v.as_f64()))
        })
        .collect();
    samples.sort_by_key(|(t, _)| *t);
    samples
}

/// Nanosecond timestamp of a window bound; only 1677..2262 is representable.
fn window_nanos(t: DateTime<Utc>) -> Result<i64> {
    t.timestamp_nanos_opt()
        .ok_or(BackendError::WindowOutOfRange(t))
}

fn empty(zero_fill: bool) -> Option<f64> {
    zero_fill.then_some(0.0)
}

/// One bucket statistic. `values` holds the bucket's non-null samples and
/// `seen` counts every sample, null or not.
pub fn aggregate(function: RateFunction, values: &[f64], seen: u64, zero_fill: bool) -> Option<f64> {
    match function {
        RateFunction::Count => {
            if seen == 0 {
                empty(zero_fill)
            } else {
                Some(seen as f64)
            }
        }
        RateFunction::Absence => {
            if seen == 0 {
                Some(1.0)
            } else {
                empty(zero_fill)
            }
        }
        RateFunction::Sum => sum(values).or_else(|| empty(zero_fill)),
        RateFunction::Average => average(values).or_else(|| empty(zero_fill)),
        RateFunction::StdDev => std_dev(values).or_else(|| empty(zero_fill)),
        RateFunction::Median
        | RateFunction::Quantile25
        | RateFunction::Quantile75
        | RateFunction::Quantile95
        | RateFunction::Quantile99 => function
            .quantile()
            .and_then(|q| quantile(q, values))
            .or_else(|| empty(zero_fill)),
    }
}

fn sum(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum())
}

fn average(values: &[f64]) -> Option<f64> {
    sum(values).map(|total| total / values.len() as f64)
}

/// Sample standard deviation; needs at least two samples.
fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = average(values)?;
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

/// Linear interpolation between the closest ranks.
fn quantile(q: f64, values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q * (sorted.len() - 1) as f64;
    let base = position.floor() as usize;
    let rest = position - base as f64;
    let lower = sorted[base];
    Some(match sorted.get(base + 1) {
        Some(upper) => lower + rest * (upper - lower),
        None => lower,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use surql_protocol::TimeRange;

    fn window(interval_secs: u64) -> QueryWindow {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 59).unwrap();
        QueryWindow::new(TimeRange::new(from, to), Duration::from_secs(interval_secs), to)
    }

    fn at(secs: u32) -> FieldValue {
        FieldValue::Time(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap())
    }

    fn metric_frame() -> DataFrame {
        DataFrame::new("A")
            .with_field(Field::new("timestamp", vec![at(5), at(1), at(25), at(26), at(27)]))
            .with_field(Field::new(
                "value",
                vec![2.0.into(), 1.0.into(), 4.0.into(), FieldValue::Null, 8.0.into()],
            ))
    }

    fn rate(functions: Vec<RateFunction>, zero_fill: bool) -> RateOptions {
        RateOptions {
            zero_fill,
            interval: Some("$interval".to_string()),
            functions,
        }
    }

    #[test]
    fn test_buckets_and_functions() {
        let mut frame = metric_frame();
        let options = rate(
            vec![RateFunction::Sum, RateFunction::Count, RateFunction::Absence],
            false,
        );
        apply(&mut frame, &options, &window(20)).unwrap();

        let names: Vec<&str> = frame.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["timestamp", "count", "sum", "absence"]);

        // from is 23:59:59.999999999, buckets of 20s up to 00:00:59.999999999
        assert_eq!(frame.row_count(), 4);
        assert_eq!(
            frame.field("count").unwrap().values,
            vec![2.0.into(), 3.0.into(), FieldValue::Null, FieldValue::Null]
        );
        assert_eq!(
            frame.field("sum").unwrap().values,
            vec![3.0.into(), 12.0.into(), FieldValue::Null, FieldValue::Null]
        );
        assert_eq!(
            frame.field("absence").unwrap().values,
            vec![FieldValue::Null, FieldValue::Null, 1.0.into(), 1.0.into()]
        );
    }

    #[test]
    fn test_zero_fill() {
        let mut frame = metric_frame();
        apply(&mut frame, &rate(vec![RateFunction::Average], true), &window(20)).unwrap();
        assert_eq!(
            frame.field("average").unwrap().values,
            vec![1.5.into(), 6.0.into(), 0.0.into(), 0.0.into()]
        );
    }

    #[test]
    fn test_empty_selection_keeps_only_time() {
        let mut frame = metric_frame();
        apply(&mut frame, &rate(Vec::new(), false), &window(30)).unwrap();
        assert_eq!(frame.fields.len(), 1);
        assert_eq!(frame.fields[0].name, "timestamp");
    }

    #[test]
    fn test_bucket_width() {
        let w = window(10);
        let mut options = rate(Vec::new(), false);
        assert_eq!(bucket_width(&options, &w).unwrap(), Duration::from_secs(10));

        options.interval = Some("1m".to_string());
        assert_eq!(bucket_width(&options, &w).unwrap(), Duration::from_secs(60));

        options.interval = None;
        assert_eq!(bucket_width(&options, &w).unwrap(), Duration::from_secs(10));

        options.interval = Some("often".to_string());
        let err = bucket_width(&options, &w).unwrap_err();
        assert!(err.to_string().starts_with("invalid interval 'often'"));

        options.interval = None;
        assert!(matches!(
            bucket_width(&options, &window(0)),
            Err(BackendError::NonPositiveInterval)
        ));
    }

    #[test]
    fn test_too_many_buckets() {
        let mut frame = metric_frame();
        let mut options = rate(vec![RateFunction::Count], false);
        options.interval = Some("1us".to_string());
        assert!(matches!(
            apply(&mut frame, &options, &window(1)),
            Err(BackendError::TooManyBuckets { .. })
        ));
    }

    #[test]
    fn test_window_beyond_nanosecond_range() {
        let from = Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
        let w = QueryWindow::new(TimeRange::new(from, to), Duration::from_secs(365 * 86_400), to);

        let mut frame = metric_frame();
        let err = apply(&mut frame, &rate(vec![RateFunction::Count], false), &w).unwrap_err();
        assert!(matches!(err, BackendError::WindowOutOfRange(_)));
        assert!(err.to_string().contains("outside the supported time range"));
    }

    #[test]
    fn test_last_bucket_near_range_end() {
        let from = Utc.with_ymd_and_hms(2262, 4, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2262, 4, 10, 0, 0, 0).unwrap();
        let w = QueryWindow::new(TimeRange::new(from, to), Duration::from_secs(3 * 86_400), to);

        let mut frame = DataFrame::new("A")
            .with_field(Field::new("timestamp", vec![FieldValue::Time(from)]))
            .with_field(Field::new("value", vec![1.0.into()]));
        apply(&mut frame, &rate(vec![RateFunction::Count], false), &w).unwrap();
        assert_eq!(frame.row_count(), 4);
        assert_eq!(frame.field("count").unwrap().values[0], 1.0.into());
    }

    #[test]
    fn test_statistics() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(aggregate(RateFunction::Median, &values, 4, false), Some(2.5));
        assert_eq!(aggregate(RateFunction::Quantile25, &values, 4, false), Some(1.75));
        assert_eq!(aggregate(RateFunction::Quantile99, &[7.0], 1, false), Some(7.0));

        let sd = aggregate(RateFunction::StdDev, &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8, false)
            .unwrap();
        assert!((sd - 2.138).abs() < 1e-3);
        assert_eq!(aggregate(RateFunction::StdDev, &[1.0], 1, false), None);
        assert_eq!(aggregate(RateFunction::StdDev, &[1.0], 1, true), Some(0.0));

        // a bucket holding only null samples still counts them
        assert_eq!(aggregate(RateFunction::Count, &[], 2, false), Some(2.0));
        assert_eq!(aggregate(RateFunction::Sum, &[], 2, false), None);
        assert_eq!(aggregate(RateFunction::Absence, &[], 2, true), Some(0.0));
    }
}

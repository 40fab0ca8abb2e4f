//! Mode-aware view of a query: the options the backend actually honours.

use surql_protocol::defaults::{
    DEFAULT_GROUP_BY_FIELD, DEFAULT_METRIC_VALUE_FIELD, DEFAULT_TIMESTAMP_FIELD,
};
use surql_protocol::{OptionalField, Query, QueryMode, RateFunction};

/// Effective processing options for one query.
///
/// Fields outside the query mode's visibility are ignored here, whatever
/// the stored query holds; empty names fall back to the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveOptions {
    pub mode: QueryMode,
    pub timestamp_field: String,
    pub log_message_field: Option<String>,
    pub metric_value_field: String,
    pub group: Option<String>,
    pub rate: Option<RateOptions>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateOptions {
    pub zero_fill: bool,
    pub interval: Option<String>,
    pub functions: Vec<RateFunction>,
}

impl EffectiveOptions {
    pub fn for_query(query: &Query) -> Self {
        let visibility = query.visibility();
        let visible = |field: OptionalField| visibility.contains(field);

        let timestamp_field = non_empty(query.timestamp_field.as_deref())
            .filter(|_| visible(OptionalField::TimestampField))
            .unwrap_or(DEFAULT_TIMESTAMP_FIELD)
            .to_string();

        let log_message_field = non_empty(query.log_message_field.as_deref())
            .filter(|_| visible(OptionalField::LogMessageField))
            .map(str::to_string);

        let metric_value_field = non_empty(query.metric_value_field.as_deref())
            .filter(|_| visible(OptionalField::MetricValueField))
            .unwrap_or(DEFAULT_METRIC_VALUE_FIELD)
            .to_string();

        let group = (visible(OptionalField::Group) && query.is_group_enabled()).then(|| {
            non_empty(query.group_by_field.as_deref())
                .unwrap_or(DEFAULT_GROUP_BY_FIELD)
                .to_string()
        });

        let rate = (visible(OptionalField::RateEnabled) && query.is_rate_enabled()).then(|| {
            RateOptions {
                zero_fill: query.is_rate_zero_fill(),
                interval: non_empty(query.rate_interval.as_deref()).map(str::to_string),
                functions: query.rate_functions().to_vec(),
            }
        });

        Self {
            mode: query.mode,
            timestamp_field,
            log_message_field,
            metric_value_field,
            group,
            rate,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(mode: QueryMode) -> Query {
        let mut query = Query::new("A", mode, "select * from cpu");
        query.timestamp_field = Some("ts".to_string());
        query.log_message_field = Some("line".to_string());
        query.metric_value_field = Some("load".to_string());
        query.group_enabled = Some(true);
        query.group_by_field = Some(String::new());
        query.rate_enabled = Some(true);
        query.rate_interval = Some("5m".to_string());
        query.rate_functions = Some(vec![RateFunction::Count]);
        query
    }

    #[test]
    fn test_raw_ignores_every_optional_field() {
        let options = EffectiveOptions::for_query(&loaded(QueryMode::Raw));
        assert_eq!(options.timestamp_field, "timestamp");
        assert_eq!(options.metric_value_field, "value");
        assert!(options.log_message_field.is_none());
        assert!(options.group.is_none());
        assert!(options.rate.is_none());
    }

    #[test]
    fn test_log_uses_timestamp_and_message() {
        let options = EffectiveOptions::for_query(&loaded(QueryMode::Log));
        assert_eq!(options.timestamp_field, "ts");
        assert_eq!(options.log_message_field.as_deref(), Some("line"));
        assert_eq!(options.metric_value_field, "value");
        assert!(options.rate.is_none());
    }

    #[test]
    fn test_metric_uses_metric_fields_and_defaults_empty_names() {
        let options = EffectiveOptions::for_query(&loaded(QueryMode::Metric));
        assert_eq!(options.timestamp_field, "ts");
        assert!(options.log_message_field.is_none());
        assert_eq!(options.metric_value_field, "load");
        assert_eq!(options.group.as_deref(), Some("group"));
        let rate = options.rate.unwrap();
        assert_eq!(rate.interval.as_deref(), Some("5m"));
        assert_eq!(rate.functions, vec![RateFunction::Count]);
        assert!(!rate.zero_fill);
    }
}

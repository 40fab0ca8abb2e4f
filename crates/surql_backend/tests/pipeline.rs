//! End-to-end query handling against a recorded SurrealDB client.

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use surql_backend::*;
use surql_datasource::{DataSource, NoTemplating, VariableQueryOptions};
use surql_protocol::{FieldValue, MetricFindValue, ScopedVars, TimeRange, VisType};

fn range() -> TimeRange {
    TimeRange::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 59).unwrap(),
    )
}

fn single(json: Value, interval: Duration) -> QueryDataRequest {
    QueryDataRequest {
        queries: vec![BackendQuery::new("A", json, range(), interval)],
    }
}

fn samples() -> Value {
    json!([
        { "id": "cpu:1", "timestamp": "2024-01-01T00:00:01Z", "host": "web", "value": 1 },
        { "id": "cpu:2", "timestamp": "2024-01-01T00:00:05Z", "host": "db", "value": 10 },
        { "id": "cpu:3", "timestamp": "2024-01-01T00:00:25Z", "host": "web", "value": 3 },
        { "id": "cpu:4", "timestamp": "2024-01-01T00:00:45Z", "host": "web", "value": 5 }
    ])
}

#[tokio::test]
async fn test_raw_query_expands_macros_and_keeps_meta() -> anyhow::Result<()> {
    let handler = QueryHandler::new(RecordedClient::with_result(samples()));
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap();
    let surql = "select * from cpu where timestamp > $from and timestamp <= $to group by $interval";

    let response = handler
        .query_data_at(
            single(json!({ "mode": "raw", "surql": surql }), Duration::from_secs(90)),
            now,
        )
        .await;

    let expected = "select * from cpu where timestamp > '2023-12-31T23:59:59.999999999Z' \
                    and timestamp <= '2024-01-01T00:00:59.999999999Z' group by 1m30s";
    assert_eq!(handler.client().executed(), vec![expected.to_string()]);

    let result = &response.responses["A"];
    assert_eq!(result.error, None);
    assert_eq!(result.frames.len(), 1);

    let frame = &result.frames[0];
    assert_eq!(frame.name, "A");
    assert_eq!(frame.field_names(), "timestamp, id, host, value");
    assert_eq!(frame.row_count(), 4);
    assert!(frame.fields[0].values[0].as_time().is_some());

    let meta = frame.meta.clone().unwrap();
    assert_eq!(meta.preferred_visualisation_type, Some(VisType::Table));
    let custom = meta.custom.unwrap();
    assert_eq!(custom.query_raw, surql);
    assert_eq!(custom.query_run, expected);
    assert_eq!(custom.status, "OK");
    assert_eq!(custom.time, "1ms");
    Ok(())
}

#[tokio::test]
async fn test_object_result_splits_per_table() {
    let handler = QueryHandler::new(RecordedClient::with_result(json!({
        "tables": { "cpu": "DEFINE TABLE cpu" },
        "users": 3
    })));
    let response = handler
        .query_data(single(json!({ "mode": "raw", "surql": "info for db" }), Duration::from_secs(1)))
        .await;

    let frames = &response.responses["A"].frames;
    let names: Vec<&str> = frames.iter().map(|frame| frame.name.as_str()).collect();
    assert_eq!(names, vec!["A:tables:cpu", "A:users"]);
    assert_eq!(frames[1].fields[0].values, vec![FieldValue::Number(3.0)]);
}

#[tokio::test]
async fn test_log_mode_orders_message_after_id() {
    let handler = QueryHandler::new(RecordedClient::with_result(json!([
        { "id": "log:1", "timestamp": "2024-01-01T00:00:01Z", "level": "warn", "msg": "disk" }
    ])));
    let response = handler
        .query_data(single(
            json!({ "mode": "log", "surql": "select * from log", "logMessage": "msg" }),
            Duration::from_secs(1),
        ))
        .await;

    let frame = &response.responses["A"].frames[0];
    assert_eq!(frame.field_names(), "timestamp, id, msg, level");
    assert_eq!(
        frame.meta.as_ref().and_then(|meta| meta.preferred_visualisation_type),
        Some(VisType::Logs)
    );
}

#[tokio::test]
async fn test_metric_group_and_rate() {
    let handler = QueryHandler::new(RecordedClient::with_result(samples()));
    let query = json!({
        "mode": "metric",
        "surql": "select * from cpu",
        "group": true,
        "groupBy": "host",
        "rate": true,
        "rateInterval": "$interval",
        "rateFunctions": ["sum", "count"]
    });
    let response = handler.query_data(single(query, Duration::from_secs(20))).await;

    let result = &response.responses["A"];
    assert_eq!(result.error, None);
    let names: Vec<&str> = result.frames.iter().map(|frame| frame.name.as_str()).collect();
    assert_eq!(names, vec!["db", "web"]);

    let web = &result.frames[1];
    assert_eq!(web.field_names(), "timestamp, count, sum");
    assert_eq!(web.row_count(), 4);
    assert_eq!(
        web.field("sum").unwrap().values,
        vec![1.0.into(), 3.0.into(), 5.0.into(), FieldValue::Null]
    );
    assert_eq!(
        web.meta.as_ref().and_then(|meta| meta.preferred_visualisation_type),
        Some(VisType::Graph)
    );
}

#[tokio::test]
async fn test_metric_errors_name_their_stage() {
    let handler = QueryHandler::new(RecordedClient::with_result(samples()));

    let response = handler
        .query_data(single(
            json!({ "mode": "metric", "surql": "x", "metricData": "load" }),
            Duration::from_secs(1),
        ))
        .await;
    assert_eq!(
        response.responses["A"].error.as_deref(),
        Some("Metric failed: data field 'load' not found in data frame, available are: timestamp, id, host, value")
    );

    let response = handler
        .query_data(single(
            json!({ "mode": "metric", "surql": "x", "rate": true, "rateInterval": "soon" }),
            Duration::from_secs(1),
        ))
        .await;
    let error = response.responses["A"].error.clone().unwrap();
    assert!(error.starts_with("Rate failed: invalid interval 'soon'"), "{}", error);

    let handler = QueryHandler::new(RecordedClient::with_result(json!(true)));
    let response = handler
        .query_data(single(json!({ "mode": "raw", "surql": "x" }), Duration::from_secs(1)))
        .await;
    assert_eq!(
        response.responses["A"].error.as_deref(),
        Some("Result failed: not supported query result type 'bool'")
    );
}

#[tokio::test]
async fn test_statement_error_is_query_failure() {
    let handler = QueryHandler::new(RecordedClient::new(json!([
        { "status": "ERR", "time": "0ms", "result": "There was a problem with the database" }
    ])));
    let response = handler
        .query_data(single(json!({ "mode": "raw", "surql": "x" }), Duration::from_secs(1)))
        .await;
    assert_eq!(
        response.responses["A"].error.as_deref(),
        Some("Query failed: There was a problem with the database")
    );
}

#[tokio::test]
async fn test_raw_mode_ignores_metric_options() {
    let handler = QueryHandler::new(RecordedClient::with_result(samples()));
    let query = json!({
        "mode": "raw",
        "surql": "select * from cpu",
        "group": true,
        "rate": true,
        "rateFunctions": ["count"]
    });
    let response = handler.query_data(single(query, Duration::from_secs(20))).await;

    let frames = &response.responses["A"].frames;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].row_count(), 4);
}

fn variable_options() -> VariableQueryOptions {
    VariableQueryOptions {
        range: range(),
        scoped_vars: ScopedVars::new(),
        variable_id: "hosts".to_string(),
    }
}

#[tokio::test]
async fn test_variable_lookup_through_local_transport() {
    let transport = LocalTransport::new(QueryHandler::new(RecordedClient::with_result(json!([
        { "name": "web" },
        { "name": "db" }
    ]))));
    let datasource = DataSource::new(transport.clone(), NoTemplating);

    let choices = datasource
        .metric_find_query("select name from host", variable_options())
        .await;
    assert_eq!(
        choices,
        Ok(vec![MetricFindValue::new("web"), MetricFindValue::new("db")])
    );
    assert_eq!(
        transport.handler().client().executed(),
        vec!["select name from host".to_string()]
    );
}

#[tokio::test]
async fn test_variable_lookup_reports_backend_error() {
    let transport = LocalTransport::new(QueryHandler::new(RecordedClient::failing("timeout")));
    let datasource = DataSource::new(transport, NoTemplating);

    let choices = datasource
        .metric_find_query("select name from host", variable_options())
        .await;
    assert_eq!(choices, Err(vec![MetricFindValue::new("Query failed: timeout")]));
}

#[tokio::test]
async fn test_rate_over_decimal_strings() {
    let handler = QueryHandler::new(RecordedClient::with_result(json!([
        { "timestamp": "2024-01-01T00:00:10Z", "value": "1.5" },
        { "timestamp": "2024-01-01T00:00:20Z", "value": "2.5" }
    ])));
    let query = json!({
        "mode": "metric",
        "surql": "select * from reading",
        "rate": true,
        "rateFunctions": ["sum"]
    });
    let response = handler.query_data(single(query, Duration::from_secs(60))).await;

    let result = &response.responses["A"];
    assert_eq!(result.error, None);
    assert_eq!(result.frames[0].field("sum").unwrap().values[0], FieldValue::Number(4.0));
}

#[tokio::test]
async fn test_rate_window_past_2262_is_an_error() {
    let handler = QueryHandler::new(RecordedClient::with_result(samples()));
    let range = TimeRange::new(
        Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap(),
    );
    let query = json!({ "mode": "metric", "surql": "x", "rate": true, "rateFunctions": ["count"] });
    let request = QueryDataRequest {
        queries: vec![BackendQuery::new("A", query, range, Duration::from_secs(365 * 86_400))],
    };
    let response = handler.query_data(request).await;

    let error = response.responses["A"].error.clone().unwrap();
    assert!(error.starts_with("Rate failed: rate window bound"), "{}", error);
}

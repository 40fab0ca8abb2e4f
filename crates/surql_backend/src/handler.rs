//! Backend query handling: one SurrealQL execution per panel query.
//!
//! Each query passes through fixed stages. The first failing stage turns
//! into the query's error message (`"<stage>: <cause>"`) and the other
//! queries of the request are unaffected.
//!
//! ```text
//! json -> hide? -> mode -> macros -> client -> frames -> [metric -> group -> rate]
//! ```

use crate::client::{StatementResult, SurrealClient};
use crate::error::{BackendError, QueryStage};
use crate::frames::build_frames;
use crate::macros::QueryWindow;
use crate::metric::{project, split_groups};
use crate::options::EffectiveOptions;
use crate::rate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use surql_protocol::{DataFrame, FrameMeta, Query, QueryMetaCustom, QueryMode, TimeRange};
use tracing::{debug, info, warn};

/// Statement used to check the connection.
pub const HEALTH_QUERY: &str = "return { database: session::db(), namespace: session::ns(), origin: session::origin() }";
pub const HEALTH_OK_MESSAGE: &str = "Data source is working";
pub const HEALTH_ERROR_PREFIX: &str = "Data source unhealthy: ";

/// One panel query as delivered to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendQuery {
    pub ref_id: String,
    /// The saved query object, exactly as stored by the editor.
    pub json: Value,
    pub time_range: TimeRange,
    pub interval: Duration,
}

impl BackendQuery {
    pub fn new(ref_id: impl Into<String>, json: Value, time_range: TimeRange, interval: Duration) -> Self {
        Self {
            ref_id: ref_id.into(),
            json,
            time_range,
            interval,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDataRequest {
    pub queries: Vec<BackendQuery>,
}

/// Frames or an error for one query. Hidden queries get neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    #[serde(default)]
    pub frames: Vec<DataFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DataResponse {
    pub fn frames(frames: Vec<DataFrame>) -> Self {
        Self {
            frames,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            frames: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Responses keyed by refId.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDataResponse {
    pub responses: BTreeMap<String, DataResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: String,
}

/// Runs panel queries against one datasource instance.
pub struct QueryHandler<C> {
    client: C,
}

impl<C: SurrealClient> QueryHandler<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run every query of the request, in order.
    pub async fn query_data(&self, request: QueryDataRequest) -> QueryDataResponse {
        self.query_data_at(request, Utc::now()).await
    }

    /// [`Self::query_data`] with an explicit value for `$now`.
    pub async fn query_data_at(&self, request: QueryDataRequest, now: DateTime<Utc>) -> QueryDataResponse {
        let mut response = QueryDataResponse::default();
        for query in request.queries {
            let ref_id = query.ref_id.clone();
            let result = self.run_query(query, now).await;
            response.responses.insert(ref_id, result);
        }
        response
    }

    async fn run_query(&self, query: BackendQuery, now: DateTime<Utc>) -> DataResponse {
        match self.execute(query, now).await {
            Ok(frames) => DataResponse::frames(frames),
            Err((stage, err)) => {
                let message = stage.message(&err);
                warn!(stage = stage.label(), error = %err, "query failed");
                DataResponse::error(message)
            }
        }
    }

    async fn execute(
        &self,
        query: BackendQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<DataFrame>, (QueryStage, BackendError)> {
        let BackendQuery {
            ref_id,
            json,
            time_range,
            interval,
        } = query;

        let Some(query) = decode_query(json, &ref_id)? else {
            debug!(ref_id = %ref_id, "skipping hidden query");
            return Ok(Vec::new());
        };
        let options = EffectiveOptions::for_query(&query);

        let window = QueryWindow::new(time_range, interval, now);
        let surql = window.expand(&query.text);
        info!(ref_id = %ref_id, mode = %options.mode, "running query");
        debug!(ref_id = %ref_id, surql = %surql, "expanded query");

        let response = self
            .client
            .query(&surql)
            .await
            .map_err(|err| (QueryStage::Query, err))?;
        let statement =
            StatementResult::from_response(&response).map_err(|err| (QueryStage::Query, err))?;

        let meta = FrameMeta {
            preferred_visualisation_type: Some(options.mode.preferred_visualisation()),
            custom: Some(QueryMetaCustom {
                query_raw: query.text.clone(),
                query_run: surql,
                status: statement.status,
                time: statement.time,
            }),
        };
        let mut frames = build_frames(&statement.result, &ref_id, &options, &meta)
            .map_err(|err| (QueryStage::Result, err))?;

        if options.mode == QueryMode::Metric {
            project(&mut frames, &options).map_err(|err| (QueryStage::Metric, err))?;

            if options.group.is_some() {
                frames = split_groups(frames).map_err(|err| (QueryStage::Group, err))?;
            }

            if let Some(rate_options) = &options.rate {
                for frame in &mut frames {
                    rate::apply(frame, rate_options, &window)
                        .map_err(|err| (QueryStage::Rate, err))?;
                }
            }
        }

        debug!(ref_id = %ref_id, frames = frames.len(), "query finished");
        Ok(frames)
    }

    /// Check the connection with a session query.
    pub async fn check_health(&self) -> HealthCheckResult {
        let outcome = match self.client.query(HEALTH_QUERY).await {
            Ok(response) => StatementResult::from_response(&response).map(|_| ()),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => HealthCheckResult {
                status: HealthStatus::Ok,
                message: HEALTH_OK_MESSAGE.to_string(),
            },
            Err(err) => {
                warn!(error = %err, "health check failed");
                HealthCheckResult {
                    status: HealthStatus::Error,
                    message: format!("{}{}", HEALTH_ERROR_PREFIX, err),
                }
            }
        }
    }
}

/// Decode the saved query. `None` for hidden queries.
///
/// `hide` is honoured before the mode is validated, so a hidden query with
/// a broken mode still yields an empty response.
fn decode_query(
    json: Value,
    ref_id: &str,
) -> Result<Option<Query>, (QueryStage, BackendError)> {
    let mut object: Map<String, Value> =
        serde_json::from_value(json).map_err(|err| (QueryStage::Json, BackendError::from(err)))?;

    if object.get("hide").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(None);
    }

    let mode = object.get("mode").and_then(Value::as_str).unwrap_or_default();
    QueryMode::from_str(mode).map_err(|err| (QueryStage::Mode, BackendError::from(err)))?;

    object
        .entry("refId")
        .or_insert_with(|| Value::String(ref_id.to_string()));

    serde_json::from_value::<Query>(Value::Object(object))
        .map(Some)
        .map_err(|err| (QueryStage::Json, BackendError::from(err)))
}

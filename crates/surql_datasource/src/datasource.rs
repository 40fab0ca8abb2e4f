//! Front-end datasource: gates and templates queries, dispatches them, and
//! resolves dashboard variables through the [`reducer`](crate::reducer).

use crate::editor::is_runnable;
use crate::error::TransportError;
use crate::reducer::{reduce, ReducedResult};
use crate::transport::{FrameStream, TemplateSrv, Transport};
use chrono::Utc;
use futures::{stream, StreamExt};
use surql_protocol::defaults::{
    INTERVAL_MS_LEGACY_VAR, INTERVAL_MS_VAR, INTERVAL_VAR, VARIABLE_QUERY_APP,
    VARIABLE_QUERY_INTERVAL, VARIABLE_QUERY_INTERVAL_MS, VARIABLE_QUERY_TIMEZONE,
};
use surql_protocol::{
    MetricFindValue, Query, QueryMode, QueryRequest, RequestId, ResponseFrame, ScopedVars,
    TimeRange,
};
use tracing::{debug, info};

/// Choices for a dashboard variable, or a one-element list carrying the
/// failure message. Both arms have the shape the host's variable system reads.
pub type VariableLookup = std::result::Result<Vec<MetricFindValue>, Vec<MetricFindValue>>;

/// Context the host passes when resolving a query variable.
#[derive(Debug, Clone)]
pub struct VariableQueryOptions {
    pub range: TimeRange,
    pub scoped_vars: ScopedVars,
    pub variable_id: String,
}

pub struct DataSource<T, S> {
    transport: T,
    templates: S,
}

impl<T: Transport, S: TemplateSrv> DataSource<T, S> {
    pub fn new(transport: T, templates: S) -> Self {
        Self {
            transport,
            templates,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Query a freshly added panel starts with.
    pub fn default_query(&self) -> Query {
        Query::default()
    }

    /// Whether `query` is included in a dispatch.
    pub fn filter_query(&self, query: &Query) -> bool {
        is_runnable(query)
    }

    /// Resolve template variables in the query text; every other field is kept.
    pub fn apply_template_variables(&self, query: &Query, scoped_vars: &ScopedVars) -> Query {
        Query {
            text: self.templates.replace(&query.text, scoped_vars),
            ..query.clone()
        }
    }

    /// Dispatch the runnable targets of `request`.
    ///
    /// When no target survives the filter the transport is not called and
    /// the stream holds a single `Done` frame without data. Transport
    /// failures are passed through as-is.
    pub fn query(&self, request: &QueryRequest) -> FrameStream {
        let targets: Vec<Query> = request
            .targets
            .iter()
            .filter(|query| {
                let keep = self.filter_query(query);
                if !keep {
                    debug!(ref_id = query.ref_id(), "skipping hidden or empty query");
                }
                keep
            })
            .map(|query| self.apply_template_variables(query, &request.scoped_vars))
            .collect();

        match request.with_targets(targets) {
            Ok(request) => {
                debug!(
                    request_id = %request.request_id,
                    targets = request.targets.len(),
                    "dispatching query request"
                );
                self.transport.query(request)
            }
            Err(_) => stream::iter(vec![Ok::<_, TransportError>(ResponseFrame::done(Vec::new()))]).boxed(),
        }
    }

    /// Resolve the choices of a query variable.
    pub async fn metric_find_query(
        &self,
        query_text: &str,
        options: VariableQueryOptions,
    ) -> VariableLookup {
        let request = variable_request(query_text, options);
        let request_id = request.request_id.clone();

        match reduce(self.query(&request)).await {
            ReducedResult::Success(values) => {
                info!(request_id = %request_id, choices = values.len(), "variable resolved");
                Ok(values.into_iter().map(MetricFindValue::new).collect())
            }
            ReducedResult::Failure(message) => {
                info!(request_id = %request_id, error = %message, "variable lookup failed");
                Err(vec![MetricFindValue::new(message)])
            }
        }
    }
}

/// Synthetic single-target raw request for a variable lookup.
fn variable_request(query_text: &str, options: VariableQueryOptions) -> QueryRequest {
    let VariableQueryOptions {
        range,
        scoped_vars,
        variable_id,
    } = options;

    let interval = scoped_vars
        .get(INTERVAL_VAR)
        .map(|var| var.text.clone())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| VARIABLE_QUERY_INTERVAL.to_string());
    let interval_ms = [INTERVAL_MS_VAR, INTERVAL_MS_LEGACY_VAR]
        .iter()
        .filter_map(|name| scoped_vars.get(*name))
        .find_map(|var| var.value.as_u64().filter(|ms| *ms > 0))
        .unwrap_or(VARIABLE_QUERY_INTERVAL_MS);

    let mut target = Query::new(variable_id.clone(), QueryMode::Raw, query_text);
    target.auto_requery = false;

    QueryRequest {
        request_id: RequestId::from_host(variable_id),
        app: VARIABLE_QUERY_APP.to_string(),
        timezone: VARIABLE_QUERY_TIMEZONE.to_string(),
        interval,
        interval_ms,
        range,
        start_time: Utc::now().timestamp_millis(),
        scoped_vars,
        targets: vec![target],
    }
}

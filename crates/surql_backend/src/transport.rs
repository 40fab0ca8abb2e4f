//! In-process [`Transport`]: serves front-end requests straight from a
//! [`QueryHandler`], without a network hop.

use crate::client::SurrealClient;
use crate::handler::{BackendQuery, QueryDataRequest, QueryHandler};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use surql_datasource::{FrameStream, Transport, TransportError};
use surql_protocol::{QueryRequest, ResponseFrame};
use tracing::debug;

/// Streams `Loading`, then one `Done` frame carrying every target's frames
/// in target order, or one `Error` frame with the first target error.
pub struct LocalTransport<C> {
    handler: Arc<QueryHandler<C>>,
}

impl<C> Clone for LocalTransport<C> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<C: SurrealClient> LocalTransport<C> {
    pub fn new(handler: QueryHandler<C>) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn handler(&self) -> &QueryHandler<C> {
        &self.handler
    }
}

impl<C: SurrealClient + 'static> Transport for LocalTransport<C> {
    fn query(&self, request: QueryRequest) -> FrameStream {
        let handler = Arc::clone(&self.handler);
        let loading = stream::once(async { Ok::<_, TransportError>(ResponseFrame::loading()) });
        let result = stream::once(async move { Ok(respond(&handler, request).await) });
        loading.chain(result).boxed()
    }
}

async fn respond<C: SurrealClient>(handler: &QueryHandler<C>, request: QueryRequest) -> ResponseFrame {
    let (ref_ids, backend_request) = match backend_request(&request) {
        Ok(converted) => converted,
        Err(err) => return ResponseFrame::error(format!("Query json: {}", err)),
    };
    debug!(request_id = %request.request_id, targets = ref_ids.len(), "dispatching locally");

    let mut response = handler.query_data(backend_request).await;
    let mut data = Vec::new();
    for ref_id in &ref_ids {
        let Some(result) = response.responses.remove(ref_id) else {
            continue;
        };
        if let Some(error) = result.error {
            return ResponseFrame::error(error);
        }
        data.extend(result.frames);
    }
    ResponseFrame::done(data)
}

fn backend_request(
    request: &QueryRequest,
) -> Result<(Vec<String>, QueryDataRequest), serde_json::Error> {
    let interval = Duration::from_millis(request.interval_ms);
    let mut ref_ids = Vec::with_capacity(request.targets.len());
    let mut queries = Vec::with_capacity(request.targets.len());
    for target in &request.targets {
        ref_ids.push(target.ref_id().to_string());
        queries.push(BackendQuery::new(
            target.ref_id(),
            serde_json::to_value(target)?,
            request.range,
            interval,
        ));
    }
    Ok((ref_ids, QueryDataRequest { queries }))
}

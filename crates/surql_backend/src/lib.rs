//! Backend half of the SurrealQL datasource.
//!
//! Executes panel queries against SurrealDB and turns statement results
//! into typed data frames:
//!
//! - [`macros`]: query window and `$interval`/`$now`/`$from`/`$to` expansion
//! - [`frames`]: statement result to frames, per result shape
//! - [`metric`] and [`rate`]: metric projection, group split, bucketing
//! - [`handler`]: per-query pipeline and the health check
//! - [`transport`]: [`LocalTransport`] bridging the front-end core to a handler
//!
//! The database connection sits behind [`SurrealClient`]: [`WsClient`] speaks
//! the WebSocket RPC protocol, [`RecordedClient`] replays canned responses.

pub mod client;
pub mod error;
pub mod frames;
pub mod handler;
pub mod macros;
pub mod metric;
pub mod options;
pub mod rate;
pub mod rpc;
pub mod transport;

pub use client::{RecordedClient, StatementResult, SurrealClient};
pub use error::{BackendError, QueryStage, Result};
pub use handler::{
    BackendQuery, DataResponse, HealthCheckResult, HealthStatus, QueryDataRequest,
    QueryDataResponse, QueryHandler,
};
pub use macros::QueryWindow;
pub use options::{EffectiveOptions, RateOptions};
pub use rpc::WsClient;
pub use transport::LocalTransport;

//! Wire types shared by the SurrealQL datasource front-end core and backend.
//!
//! - [`Query`] and [`QueryRequest`]: what a panel or variable asks for
//! - [`ResponseFrame`], [`DataFrame`], [`Field`], [`FieldValue`]: what comes back
//! - [`DatasourceConfig`]: per-instance connection settings

pub mod config;
pub mod defaults;
pub mod duration;
pub mod error;
pub mod frame;
pub mod query;
pub mod types;

pub use config::{DatasourceConfig, DatasourceOptions};
pub use error::{ProtocolError, Result};
pub use frame::{
    DataFrame, Field, FieldValue, FrameError, FrameMeta, MetricFindValue, QueryMetaCustom,
    ResponseFrame,
};
pub use query::{
    DataQuery, ModeFieldVisibility, OptionalField, Query, QueryRequest, ScopedVar, ScopedVars,
    TimeRange,
};
pub use surql_ids::RequestId;
pub use types::{LoadingState, QueryMode, RateFunction, VisType};

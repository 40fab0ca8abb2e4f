//! Front-end core of the SurrealQL datasource.
//!
//! - [`editor`]: query edits and the mode/requery policy
//! - [`reducer`]: streamed response to variable choices
//! - [`datasource`]: query gate, templating, dispatch, variable lookup
//! - [`transport`]: the collaborator traits the host implements

pub mod datasource;
pub mod editor;
pub mod error;
pub mod reducer;
pub mod transport;

pub use datasource::{DataSource, VariableLookup, VariableQueryOptions};
pub use editor::{
    build_request_target, is_runnable, set_auto_requery, set_field, set_mode, EditOutcome,
    EditorHost, FieldEdit, ModeChangePolicy, QueryEditor,
};
pub use error::TransportError;
pub use reducer::{reduce, ReducedResult, Resolution, ResultReducer};
pub use transport::{FrameStream, NoTemplating, TemplateSrv, Transport};

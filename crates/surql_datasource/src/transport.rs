//! Collaborator seams: the host transport and template substitution.

use crate::error::TransportError;
use futures::stream::BoxStream;
use surql_protocol::{QueryRequest, ResponseFrame, ScopedVars};

/// Push-based response stream for one dispatched request.
///
/// Ends exactly once: either the stream finishes (completion) or it yields
/// an `Err` (transport failure). Frames arrive in transport order.
pub type FrameStream = BoxStream<'static, Result<ResponseFrame, TransportError>>;

/// Sends requests to the backend and streams the responses back.
pub trait Transport: Send + Sync {
    fn query(&self, request: QueryRequest) -> FrameStream;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn query(&self, request: QueryRequest) -> FrameStream {
        (**self).query(request)
    }
}

/// Resolves `${variable}` placeholders in query text. Pure.
pub trait TemplateSrv: Send + Sync {
    fn replace(&self, text: &str, scoped_vars: &ScopedVars) -> String;
}

impl<F> TemplateSrv for F
where
    F: Fn(&str, &ScopedVars) -> String + Send + Sync,
{
    fn replace(&self, text: &str, scoped_vars: &ScopedVars) -> String {
        self(text, scoped_vars)
    }
}

/// Leaves query text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplating;

impl TemplateSrv for NoTemplating {
    fn replace(&self, text: &str, _scoped_vars: &ScopedVars) -> String {
        text.to_string()
    }
}

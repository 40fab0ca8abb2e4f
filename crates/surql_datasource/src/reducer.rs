//! One-shot reduction of a streamed response into variable choices.
//!
//! A [`ResultReducer`] observes one response stream, keeps only the most
//! recent frame, and resolves its [`Resolution`] exactly once: on stream
//! completion (from the retained frame) or on a transport error.

use crate::error::TransportError;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use surql_protocol::defaults::{INTERNAL_ERROR_MESSAGE, QUERY_FAILED_PREFIX};
use surql_protocol::{LoadingState, ResponseFrame};
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

/// Terminal outcome of a variable lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReducedResult {
    /// Display strings of the first field of the first table, in order
    Success(Vec<String>),
    Failure(String),
}

impl ReducedResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ReducedResult::Success(_))
    }
}

/// Single-use observer of one response stream.
pub struct ResultReducer {
    latest: Option<ResponseFrame>,
    latch: Option<oneshot::Sender<ReducedResult>>,
}

/// Completes once the paired reducer resolves.
///
/// Yields `None` if the reducer was dropped without resolving, which only
/// happens when its stream was abandoned before terminating.
pub struct Resolution {
    rx: oneshot::Receiver<ReducedResult>,
}

impl Future for Resolution {
    type Output = Option<ReducedResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

impl ResultReducer {
    pub fn new() -> (Self, Resolution) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                latest: None,
                latch: Some(tx),
            },
            Resolution { rx },
        )
    }

    pub fn is_resolved(&self) -> bool {
        self.latch.is_none()
    }

    /// Retain `frame`, discarding any earlier one. Ignored once resolved.
    pub fn next(&mut self, frame: ResponseFrame) {
        if self.is_resolved() {
            return;
        }
        debug!(state = %frame.state, "variable query frame");
        self.latest = Some(frame);
    }

    /// Transport failure: resolve with a prefixed failure.
    pub fn error(&mut self, err: TransportError) {
        warn!(error = %err, "variable query transport failure");
        self.resolve(ReducedResult::Failure(format!("{}{}", QUERY_FAILED_PREFIX, err)));
    }

    /// Stream completion: resolve from the retained frame.
    pub fn complete(&mut self) {
        if self.is_resolved() {
            return;
        }
        let result = match self.latest.take() {
            Some(frame) => reduce_frame(frame),
            None => {
                error!("variable query completed without any frame");
                ReducedResult::Failure(INTERNAL_ERROR_MESSAGE.to_string())
            }
        };
        self.resolve(result);
    }

    /// Feed every element of `stream` into the reducer until it terminates.
    pub async fn drive<S>(mut self, stream: S)
    where
        S: Stream<Item = Result<ResponseFrame, TransportError>>,
    {
        futures::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(frame) => self.next(frame),
                Err(err) => {
                    self.error(err);
                    return;
                }
            }
        }
        self.complete();
    }

    fn resolve(&mut self, result: ReducedResult) {
        if let Some(latch) = self.latch.take() {
            let _ = latch.send(result);
        }
    }
}

/// Subscribe to `stream` and wait for its single outcome.
pub async fn reduce<S>(stream: S) -> ReducedResult
where
    S: Stream<Item = Result<ResponseFrame, TransportError>>,
{
    let (reducer, resolution) = ResultReducer::new();
    reducer.drive(stream).await;
    resolution
        .await
        .unwrap_or_else(|| ReducedResult::Failure(INTERNAL_ERROR_MESSAGE.to_string()))
}

fn reduce_frame(frame: ResponseFrame) -> ReducedResult {
    match frame.state {
        LoadingState::Done => {
            let values = match frame.first_field() {
                Some(field) => field.display_values(),
                None => {
                    warn!("variable query returned no table; resolving with no choices");
                    Vec::new()
                }
            };
            ReducedResult::Success(values)
        }
        LoadingState::Error => match frame.error {
            Some(err) => ReducedResult::Failure(err.message),
            None => {
                error!("variable query failed without an error message");
                ReducedResult::Failure(INTERNAL_ERROR_MESSAGE.to_string())
            }
        },
        state => {
            error!(%state, "variable query completed in a non-terminal state");
            ReducedResult::Failure(INTERNAL_ERROR_MESSAGE.to_string())
        }
    }
}

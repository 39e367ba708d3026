use std::{future::Future, time::Duration};

use reqwest::RequestBuilder;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ResolveError;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Per-request cancellation token, optional deadline and optional correlation id.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// A timeout too large to represent as an instant leaves the context without a deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Adds the correlation header, if any, to an outbound request.
    pub fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.correlation_id {
            Some(id) => request.header(CORRELATION_HEADER, id),
            None => request,
        }
    }

    /// Drives `call` until it finishes, the token is cancelled or the deadline
    /// passes, whichever comes first. The losing future is dropped.
    pub async fn run<T, F>(&self, service: &'static str, call: F) -> Result<T, ResolveError>
    where
        F: Future<Output = Result<T, ResolveError>>,
    {
        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ResolveError::Cancelled { service }),
                res = call => res,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or(Err(ResolveError::DeadlineExceeded { service })),
            None => guarded.await,
        }
    }
}

//! Request-scoped trace identifier for correlation across logs and errors.
//!
//! The trace middleware scopes a `TraceId` over each request in tokio
//! task-local storage. `Error` constructors read it, so a conflict raised
//! while allocating stock or posting a payment reports the same id the
//! client sees in the response header.
//!
//! Spawned tasks do not inherit it; the job worker runs outside any request.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static TRACE_ID: TraceId;
}

/// Response header carrying the request's trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Identifier correlating one API request with its logs, error payloads and
/// `trace-id` response header.
///
/// # Examples
/// ```
/// use backend::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let request: TraceId = "3fa85f64-5717-4562-b3fc-2c963f66afa6"
///     .parse()
///     .expect("valid UUID");
/// let seen_by_service = TraceId::scope(request, async { TraceId::current() }).await;
/// assert_eq!(seen_by_service, Some(request));
/// assert_eq!(TraceId::current(), None);
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new random trace identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the current trace identifier if one is in scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Execute the provided future with the supplied trace identifier in scope.
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

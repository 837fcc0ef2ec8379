//! Request lifecycle with a one-shot outcome cell.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::core::RequestError;
use crate::util::serde::RequestId;

/// Result recorded for a request: a success value or a failure cause.
pub type Outcome = Result<u64, RequestError>;

struct RequestInner {
    id: RequestId,
    processing_duration: Duration,
    timeout: Option<Duration>,
    submitted_at: Mutex<Option<Duration>>,
    outcome: watch::Sender<Option<Outcome>>,
}

/// One job submitted to a pool.
///
/// The handle is cheap to clone; every clone observes the same outcome. The
/// outcome can be written once. Later `succeed`/`fail` calls are no-ops.
#[derive(Clone)]
pub struct RequestLifecycle {
    inner: Arc<RequestInner>,
}

impl RequestLifecycle {
    /// Create a request that occupies a slot for `processing_duration`.
    pub fn new(id: RequestId, processing_duration: Duration) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            inner: Arc::new(RequestInner {
                id,
                processing_duration,
                timeout: None,
                submitted_at: Mutex::new(None),
                outcome,
            }),
        }
    }

    /// Create a request that fails with [`RequestError::TimedOut`] if it is
    /// not resolved within `timeout` of its submission.
    pub fn with_timeout(id: RequestId, processing_duration: Duration, timeout: Duration) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            inner: Arc::new(RequestInner {
                id,
                processing_duration,
                timeout: Some(timeout),
                submitted_at: Mutex::new(None),
                outcome,
            }),
        }
    }

    /// Request identifier.
    pub fn id(&self) -> RequestId {
        self.inner.id
    }

    /// Time the request holds a slot once admitted.
    pub fn processing_duration(&self) -> Duration {
        self.inner.processing_duration
    }

    /// Per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    /// Simulated time of submission, once submitted.
    pub fn submission_time(&self) -> Option<Duration> {
        *self.inner.submitted_at.lock()
    }

    /// Stamp the submission time. Returns `false` if already submitted.
    pub(crate) fn mark_submitted(&self, at: Duration) -> bool {
        let mut submitted = self.inner.submitted_at.lock();
        if submitted.is_some() {
            return false;
        }
        *submitted = Some(at);
        true
    }

    /// Resolve with a success value. Returns `true` if this call resolved it.
    pub fn succeed(&self, value: u64) -> bool {
        self.resolve(Ok(value))
    }

    /// Resolve with a failure cause. Returns `true` if this call resolved it.
    pub fn fail(&self, cause: RequestError) -> bool {
        self.resolve(Err(cause))
    }

    fn resolve(&self, outcome: Outcome) -> bool {
        let mut pending = Some(outcome);
        self.inner.outcome.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = pending.take();
            true
        })
    }

    /// Whether an outcome has been recorded.
    pub fn is_resolved(&self) -> bool {
        self.inner.outcome.borrow().is_some()
    }

    /// Recorded outcome, without waiting.
    pub fn outcome(&self) -> Option<Outcome> {
        self.inner.outcome.borrow().clone()
    }

    /// Wait until the request is resolved and return its outcome.
    ///
    /// Returns immediately if the outcome is already recorded.
    pub async fn wait_for_completion(&self) -> Outcome {
        let mut rx = self.inner.outcome.subscribe();
        let outcome = rx.wait_for(Option::is_some).await.map(|o| (*o).clone());
        outcome
            .ok()
            .flatten()
            .unwrap_or(Err(RequestError::Abandoned))
    }
}

impl std::fmt::Debug for RequestLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLifecycle")
            .field("id", &self.inner.id)
            .field("processing_duration", &self.inner.processing_duration)
            .field("timeout", &self.inner.timeout)
            .field("submitted_at", &self.submission_time())
            .field("outcome", &self.outcome())
            .finish()
    }
}

//! Error types for pool operations and request outcomes.

use std::time::Duration;

use thiserror::Error;

use crate::util::serde::RequestId;

/// Errors returned synchronously by pool operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Capacity must be at least one slot.
    #[error("invalid capacity {0}: capacity must be greater than 0")]
    InvalidCapacity(u32),
    /// Pool limits or configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The request handle was already submitted to a pool.
    #[error("request {0} was already submitted")]
    AlreadySubmitted(RequestId),
}

/// Failure causes written into a request's outcome cell.
///
/// These never surface from `submit`; callers observe them by waiting on the
/// request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The wait queue was at its bound when the request arrived.
    #[error("queue full on pool `{pool}` (max queue length {max_queue_len})")]
    QueueFull {
        /// Pool that rejected the request.
        pool: String,
        /// Configured queue bound.
        max_queue_len: usize,
    },
    /// The request timeout elapsed before it was served.
    #[error("request timed out after {after:?}")]
    TimedOut {
        /// Timeout that elapsed.
        after: Duration,
    },
    /// The pool dropped the request before granting it a slot.
    #[error("request abandoned before completion")]
    Abandoned,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

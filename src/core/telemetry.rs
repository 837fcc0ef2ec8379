//! Append-only pool telemetry: submissions, failures and queue depth.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::CapacityChange;
use crate::util::serde::RequestId;

/// A request identifier stamped with simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    /// When the entry was recorded.
    #[serde(with = "crate::util::serde::duration_secs")]
    pub at: Duration,
    /// Request the entry refers to.
    pub request_id: RequestId,
}

/// Queue depth observed right after a queue-mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepthSample {
    /// When the sample was taken.
    #[serde(with = "crate::util::serde::duration_secs")]
    pub at: Duration,
    /// Number of requests waiting for a slot.
    pub depth: usize,
}

/// Logs owned by a pool. Entries are only ever appended, in the order the
/// pool performs the underlying operations.
#[derive(Debug, Default, Clone)]
pub struct PoolTelemetry {
    submissions: Vec<RequestLogEntry>,
    failures: Vec<RequestLogEntry>,
    queue_depth: Vec<QueueDepthSample>,
}

impl PoolTelemetry {
    /// Empty logs.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_submission(&mut self, at: Duration, request_id: RequestId) {
        self.submissions.push(RequestLogEntry { at, request_id });
    }

    pub(crate) fn record_failure(&mut self, at: Duration, request_id: RequestId) {
        self.failures.push(RequestLogEntry { at, request_id });
    }

    pub(crate) fn record_queue_depth(&mut self, at: Duration, depth: usize) {
        self.queue_depth.push(QueueDepthSample { at, depth });
    }

    /// Copy of the submission log.
    pub fn submissions(&self) -> Vec<RequestLogEntry> {
        self.submissions.clone()
    }

    /// Copy of the failure log.
    pub fn failures(&self) -> Vec<RequestLogEntry> {
        self.failures.clone()
    }

    /// Copy of the queue-depth log.
    pub fn queue_depth(&self) -> Vec<QueueDepthSample> {
        self.queue_depth.clone()
    }
}

/// Point-in-time export of a pool's logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Pool the logs belong to.
    pub pool: String,
    /// `(time, request)` for every submission.
    pub submissions: Vec<RequestLogEntry>,
    /// `(time, request)` for every rejected or timed-out request.
    pub failures: Vec<RequestLogEntry>,
    /// `(time, depth)` after every queue-mutating operation.
    pub queue_depth: Vec<QueueDepthSample>,
    /// Realized capacity changes.
    pub capacity: Vec<CapacityChange>,
}

impl TelemetrySnapshot {
    /// Serialize the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

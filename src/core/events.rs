//! Pool event sinks.
//!
//! A pool reports every state transition to an optional [`EventSink`] owned by
//! that pool. Sinks are injected through the pool builder; nothing here is
//! process-wide.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::serde::{RequestId, SlotId};

/// What happened in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PoolAction {
    /// A request was handed to the pool.
    Submit {
        /// Request identifier.
        request_id: RequestId,
    },
    /// The wait queue was full; the request failed with `QueueFull`.
    Reject {
        /// Request identifier.
        request_id: RequestId,
        /// Queue length at rejection.
        queue_len: usize,
    },
    /// The request joined the wait queue.
    Enqueue {
        /// Request identifier.
        request_id: RequestId,
        /// Queue length after joining.
        queue_len: usize,
    },
    /// The request was granted a slot.
    Admit {
        /// Request identifier.
        request_id: RequestId,
        /// Slot granted.
        slot: SlotId,
    },
    /// The request finished and gave its slot back.
    Release {
        /// Request identifier.
        request_id: RequestId,
        /// Slot released.
        slot: SlotId,
    },
    /// Realized capacity changed.
    Resize {
        /// Capacity target after the change.
        target: u32,
        /// Capacity now in force.
        effective: u32,
    },
    /// The request timed out before being served.
    Expire {
        /// Request identifier.
        request_id: RequestId,
    },
}

/// A pool action stamped with pool name and simulated time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEvent {
    /// Pool that produced the event.
    pub pool: String,
    /// Simulated time of the action.
    #[serde(with = "crate::util::serde::duration_secs")]
    pub at: Duration,
    /// The action itself.
    #[serde(flatten)]
    pub action: PoolAction,
}

/// Event sink abstraction.
///
/// The pool delivers events after releasing its state lock, so `record` may
/// query the pool it observes. It must not submit to or resize that pool:
/// delivery holds the sink, and those operations deliver events themselves.
pub trait EventSink: Send {
    /// Record an event.
    fn record(&mut self, event: PoolEvent);
}

/// In-memory sink keeping the most recent events.
pub struct InMemoryEventSink {
    events: VecDeque<PoolEvent>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a sink that keeps at most `max_events`.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.iter().cloned().collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&mut self, event: PoolEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink that forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&mut self, event: PoolEvent) {
        tracing::debug!(
            pool = %event.pool,
            at = event.at.as_secs_f64(),
            action = ?event.action,
            "pool event"
        );
    }
}

/// Sink shared between the pool and an observer.
///
/// The pool needs to own its sink; tests and harnesses still want to read what
/// was recorded. Clones see the same buffer.
pub struct SharedEventSink<T> {
    inner: std::sync::Arc<parking_lot::Mutex<T>>,
}

impl<T> Clone for SharedEventSink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: std::sync::Arc::clone(&self.inner),
        }
    }
}

impl<T: EventSink> SharedEventSink<T> {
    /// Wrap a sink.
    pub fn new(sink: T) -> Self {
        Self {
            inner: std::sync::Arc::new(parking_lot::Mutex::new(sink)),
        }
    }

    /// Run `f` with the wrapped sink.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.lock())
    }
}

impl<T: EventSink> EventSink for SharedEventSink<T> {
    fn record(&mut self, event: PoolEvent) {
        self.inner.lock().record(event);
    }
}

/// Helper to stamp an action with pool and time.
pub fn build_pool_event(pool: impl Into<String>, at: Duration, action: PoolAction) -> PoolEvent {
    PoolEvent {
        pool: pool.into(),
        at,
        action,
    }
}

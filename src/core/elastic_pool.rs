//! Elastic resource pool: bounded admission, FIFO slot grants and resizable
//! capacity with deferred shrink.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::core::{
    build_pool_event, CapacityChange, CapacityPlan, EventSink, PoolAction, PoolError, PoolEvent,
    PoolTelemetry, QueueDepthSample, RequestError, RequestLifecycle, RequestLogEntry, Resize,
    TelemetrySnapshot, UsageAccountant,
};
use crate::util::clock::{Clock, TokioClock};
use crate::util::serde::{RequestId, SlotId};

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Configuration values for capacity enforcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLimits {
    /// Initial number of slots.
    pub capacity: u32,
    /// Maximum number of requests waiting for a slot.
    pub max_queue_len: usize,
    /// Timeout applied to requests that carry none of their own.
    pub request_timeout: Option<Duration>,
}

impl PoolLimits {
    /// Limits with no default request timeout.
    pub const fn new(capacity: u32, max_queue_len: usize) -> Self {
        Self {
            capacity,
            max_queue_len,
            request_timeout: None,
        }
    }

    /// Set the default request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Reject zero capacity, zero queue bound and zero timeout.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidCapacity(self.capacity));
        }
        if self.max_queue_len == 0 {
            return Err(PoolError::InvalidConfig(
                "max_queue_len must be greater than 0".into(),
            ));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PoolError::InvalidConfig(
                "request_timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Point-in-time view of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Pool name.
    pub name: String,
    /// Capacity target.
    pub capacity: u32,
    /// Capacity currently in force.
    pub effective_capacity: u32,
    /// Busy slots.
    pub active: u32,
    /// Requests waiting for a slot.
    pub queue_len: usize,
    /// Wait queue bound.
    pub max_queue_len: usize,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} usage: {}/{}VMs {}/{}",
            self.name, self.active, self.capacity, self.queue_len, self.max_queue_len
        )
    }
}

struct Waiter {
    request_id: RequestId,
    grant: oneshot::Sender<SlotLease>,
}

enum Admission {
    Granted(SlotId),
    Queued(oneshot::Receiver<SlotLease>),
    Rejected { queue_len: usize },
}

/// Everything mutated by submissions, releases and resizes. Only touched
/// under the pool mutex and never across a suspension point.
struct PoolState {
    name: String,
    capacity: CapacityPlan,
    occupied: BTreeSet<SlotId>,
    waiters: VecDeque<Waiter>,
    telemetry: PoolTelemetry,
    usage: Arc<dyn UsageAccountant>,
    observed: bool,
    pending_events: Vec<PoolEvent>,
}

impl PoolState {
    fn active(&self) -> u32 {
        u32::try_from(self.occupied.len()).unwrap_or(u32::MAX)
    }

    fn emit(&mut self, at: Duration, action: PoolAction) {
        if self.observed {
            self.pending_events
                .push(build_pool_event(self.name.clone(), at, action));
        }
    }

    fn sample_queue_depth(&mut self, at: Duration) {
        self.telemetry.record_queue_depth(at, self.waiters.len());
    }

    /// Lowest free slot index, marked occupied.
    fn occupy(&mut self) -> SlotId {
        let slot = (0..=self.occupied.len())
            .find(|id| !self.occupied.contains(id))
            .unwrap_or(self.occupied.len());
        self.occupied.insert(slot);
        slot
    }

    fn submit(&mut self, at: Duration, request_id: RequestId, max_queue_len: usize) -> Admission {
        self.telemetry.record_submission(at, request_id);
        self.emit(at, PoolAction::Submit { request_id });

        if self.waiters.is_empty() && self.capacity.has_headroom(self.active()) {
            let slot = self.occupy();
            self.sample_queue_depth(at);
            self.emit(at, PoolAction::Admit { request_id, slot });
            return Admission::Granted(slot);
        }

        let queue_len = self.waiters.len();
        if queue_len >= max_queue_len {
            self.telemetry.record_failure(at, request_id);
            self.sample_queue_depth(at);
            self.emit(at, PoolAction::Reject { request_id, queue_len });
            return Admission::Rejected { queue_len };
        }

        let (grant, granted) = oneshot::channel();
        self.waiters.push_back(Waiter { request_id, grant });
        self.sample_queue_depth(at);
        self.emit(
            at,
            PoolAction::Enqueue {
                request_id,
                queue_len: self.waiters.len(),
            },
        );
        Admission::Queued(granted)
    }

    /// Grant slots to the head of the wait queue while headroom remains.
    fn admit_waiters(&mut self, at: Duration, shared: &Arc<Shared>) -> usize {
        let mut admitted = 0;
        while self.capacity.has_headroom(self.active()) {
            let Some(waiter) = self.waiters.pop_front() else {
                break;
            };
            let slot = self.occupy();
            let lease = SlotLease::new(shared, slot, waiter.request_id);
            if let Err(lease) = waiter.grant.send(lease) {
                // Admission task is gone; hand the slot to the next waiter.
                self.occupied.remove(&lease.disarm());
                self.sample_queue_depth(at);
                tracing::debug!("waiter for request {} dropped before grant", waiter.request_id);
                continue;
            }
            admitted += 1;
            self.sample_queue_depth(at);
            self.emit(
                at,
                PoolAction::Admit {
                    request_id: waiter.request_id,
                    slot,
                },
            );
            tracing::debug!("woke request {} on slot {}", waiter.request_id, slot);
        }
        admitted
    }

    fn release(&mut self, at: Duration, slot: SlotId, request_id: RequestId, shared: &Arc<Shared>) {
        if let Some(change) = self.capacity.on_release(self.active(), at) {
            self.capacity_realized(change);
        }
        self.occupied.remove(&slot);
        self.sample_queue_depth(at);
        self.emit(at, PoolAction::Release { request_id, slot });
        tracing::debug!(
            "released slot {} from request {}, active: {}",
            slot,
            request_id,
            self.active()
        );
        self.admit_waiters(at, shared);
    }

    fn resize(&mut self, at: Duration, new_capacity: u32, shared: &Arc<Shared>) -> Result<Resize, PoolError> {
        let resize = self.capacity.resize(new_capacity, self.active(), at)?;
        match resize {
            Resize::Grown(change) => {
                self.capacity_realized(change);
                let admitted = self.admit_waiters(at, shared);
                tracing::info!(
                    "pool {} grew to {} slots, admitted {} waiting requests",
                    self.name,
                    new_capacity,
                    admitted
                );
            }
            Resize::Shrunk(change) => {
                self.capacity_realized(change);
                tracing::info!(
                    "pool {} shrunk to {} slots ({} in force)",
                    self.name,
                    new_capacity,
                    change.capacity
                );
            }
            Resize::Deferred => {
                tracing::info!(
                    "pool {} has {} busy slots; shrink to {} deferred until slots are released",
                    self.name,
                    self.active(),
                    new_capacity
                );
            }
            Resize::Unchanged => {
                tracing::debug!("pool {} already at {} slots", self.name, new_capacity);
            }
        }
        Ok(resize)
    }

    fn capacity_realized(&mut self, change: CapacityChange) {
        self.usage.capacity_changed(change);
        let target = self.capacity.target();
        self.emit(
            change.at,
            PoolAction::Resize {
                target,
                effective: change.capacity,
            },
        );
    }

    fn expire(&mut self, at: Duration, request_id: RequestId) {
        self.telemetry.record_failure(at, request_id);
        self.emit(at, PoolAction::Expire { request_id });
    }
}

struct Shared {
    limits: PoolLimits,
    clock: TokioClock,
    usage: Arc<dyn UsageAccountant>,
    state: Mutex<PoolState>,
    events: Option<Mutex<Box<dyn EventSink>>>,
}

enum Ticket {
    Ready(SlotLease),
    Waiting(oneshot::Receiver<SlotLease>),
}

/// Holds an occupied slot; gives it back to the pool when dropped.
///
/// Created the moment a slot is granted and moved into the admission task, so
/// the slot is released even if that task never runs.
struct SlotLease {
    shared: Option<Arc<Shared>>,
    slot: SlotId,
    request_id: RequestId,
}

impl SlotLease {
    fn new(shared: &Arc<Shared>, slot: SlotId, request_id: RequestId) -> Self {
        Self {
            shared: Some(Arc::clone(shared)),
            slot,
            request_id,
        }
    }

    /// Give the slot back to a caller that already holds the state lock.
    fn disarm(mut self) -> SlotId {
        self.shared = None;
        self.slot
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            let now = shared.clock.now();
            shared.with_state(|state| state.release(now, self.slot, self.request_id, &shared));
        }
    }
}

impl Shared {
    /// Run `f` under the state lock, then deliver the events it produced with
    /// the lock released.
    fn with_state<R>(&self, f: impl FnOnce(&mut PoolState) -> R) -> R {
        let (result, events) = {
            let mut state = self.state.lock();
            let result = f(&mut state);
            (result, std::mem::take(&mut state.pending_events))
        };
        if let Some(sink) = &self.events {
            if !events.is_empty() {
                let mut sink = sink.lock();
                for event in events {
                    sink.record(event);
                }
            }
        }
        result
    }

    /// Admission task body: wait for a slot, execute, release.
    async fn serve(self: Arc<Self>, request: RequestLifecycle, ticket: Ticket) {
        let request_id = request.id();
        let lease = match ticket {
            Ticket::Ready(lease) => lease,
            Ticket::Waiting(granted) => {
                if let Ok(lease) = granted.await {
                    lease
                } else {
                    tracing::error!("request {} lost its place in the wait queue", request_id);
                    request.fail(RequestError::Abandoned);
                    return;
                }
            }
        };

        {
            let _busy = self.usage.record_usage(lease.slot);
            tracing::debug!(
                "executing request {} on slot {} for {:?}",
                request_id,
                lease.slot,
                request.processing_duration()
            );
            tokio::time::sleep(request.processing_duration()).await;
            if !request.succeed(0) {
                tracing::debug!("request {} was already resolved", request_id);
            }
        }
        drop(lease);
    }

    async fn expire_at(
        self: Arc<Self>,
        request: RequestLifecycle,
        deadline: tokio::time::Instant,
        after: Duration,
    ) {
        tokio::select! {
            () = tokio::time::sleep_until(deadline) => {}
            _ = request.wait_for_completion() => return,
        }
        if request.fail(RequestError::TimedOut { after }) {
            let now = self.clock.now();
            let request_id = request.id();
            self.with_state(|state| state.expire(now, request_id));
            tracing::warn!("request {} timed out after {:?}", request_id, after);
        }
    }
}

/// Elastic pool of slots serving requests through a bounded FIFO queue.
///
/// Capacity can be changed at any time with [`ElasticPool::set_capacity`].
/// Growth is realized at once and immediately admits waiting requests.
/// Shrinking never evicts running work: slots above the new target are
/// withheld as they are released.
pub struct ElasticPool<S> {
    name: String,
    shared: Arc<Shared>,
    spawner: S,
}

impl<S: Clone> Clone for ElasticPool<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            shared: Arc::clone(&self.shared),
            spawner: self.spawner.clone(),
        }
    }
}

impl<S> ElasticPool<S> {
    /// Assemble a pool from its collaborators. Used by the builder.
    pub(crate) fn from_parts(
        name: String,
        limits: PoolLimits,
        spawner: S,
        clock: TokioClock,
        usage: Arc<dyn UsageAccountant>,
        events: Option<Box<dyn EventSink>>,
    ) -> Result<Self, PoolError> {
        limits.validate()?;
        let capacity = CapacityPlan::new(limits.capacity, clock.now())?;
        for change in capacity.history() {
            usage.capacity_changed(*change);
        }

        let state = PoolState {
            name: name.clone(),
            capacity,
            occupied: BTreeSet::new(),
            waiters: VecDeque::new(),
            telemetry: PoolTelemetry::new(),
            usage: Arc::clone(&usage),
            observed: events.is_some(),
            pending_events: Vec::new(),
        };
        tracing::debug!(
            "created pool {} with {} slots and queue bound {}",
            name,
            limits.capacity,
            limits.max_queue_len
        );
        Ok(Self {
            name,
            shared: Arc::new(Shared {
                limits,
                clock,
                usage,
                state: Mutex::new(state),
                events: events.map(Mutex::new),
            }),
            spawner,
        })
    }

    /// Create a pool with a tokio clock and an in-memory usage tracker.
    pub fn new(name: impl Into<String>, limits: PoolLimits, spawner: S) -> Result<Self, PoolError> {
        crate::builders::PoolBuilder::new(limits).name(name).build(spawner)
    }

    /// Pool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Limits the pool was created with.
    pub fn limits(&self) -> &PoolLimits {
        &self.shared.limits
    }

    /// Current simulated time.
    pub fn now(&self) -> Duration {
        self.shared.clock.now()
    }

    /// Capacity target most recently requested.
    pub fn capacity(&self) -> u32 {
        self.shared.state.lock().capacity.target()
    }

    /// Capacity currently in force, including unrealized shrink steps.
    pub fn effective_capacity(&self) -> u32 {
        self.shared.state.lock().capacity.effective()
    }

    /// Busy slots.
    pub fn active_count(&self) -> u32 {
        self.shared.state.lock().active()
    }

    /// Requests waiting for a slot.
    pub fn queue_len(&self) -> usize {
        self.shared.state.lock().waiters.len()
    }

    /// Wait queue bound.
    pub fn max_queue_len(&self) -> usize {
        self.shared.limits.max_queue_len
    }

    /// Busy fraction of the realized capacity over the trailing window.
    pub fn usage_in_window(&self, window: Duration) -> f64 {
        self.shared.usage.usage_in_window(window)
    }

    /// Copy of the submission log.
    pub fn submission_log(&self) -> Vec<RequestLogEntry> {
        self.shared.state.lock().telemetry.submissions()
    }

    /// Copy of the failure log.
    pub fn failure_log(&self) -> Vec<RequestLogEntry> {
        self.shared.state.lock().telemetry.failures()
    }

    /// Copy of the queue-depth log.
    pub fn queue_depth_log(&self) -> Vec<QueueDepthSample> {
        self.shared.state.lock().telemetry.queue_depth()
    }

    /// Realized capacity changes, oldest first.
    pub fn capacity_log(&self) -> Vec<CapacityChange> {
        self.shared.state.lock().capacity.history().to_vec()
    }

    /// Export all logs at once.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        let state = self.shared.state.lock();
        TelemetrySnapshot {
            pool: self.name.clone(),
            submissions: state.telemetry.submissions(),
            failures: state.telemetry.failures(),
            queue_depth: state.telemetry.queue_depth(),
            capacity: state.capacity.history().to_vec(),
        }
    }

    /// Current occupancy and capacity.
    pub fn status(&self) -> PoolStatus {
        let state = self.shared.state.lock();
        PoolStatus {
            name: self.name.clone(),
            capacity: state.capacity.target(),
            effective_capacity: state.capacity.effective(),
            active: state.active(),
            queue_len: state.waiters.len(),
            max_queue_len: self.shared.limits.max_queue_len,
        }
    }

    /// Change the number of slots.
    ///
    /// Growth takes effect now and admits waiting requests up to the new
    /// headroom. A shrink takes effect now down to the busy slot count; the
    /// remainder is realized as running requests release their slots.
    pub fn set_capacity(&self, new_capacity: u32) -> Result<Resize, PoolError> {
        let now = self.shared.clock.now();
        let shared = &self.shared;
        shared.with_state(|state| state.resize(now, new_capacity, shared))
    }
}

impl<S> ElasticPool<S>
where
    S: Spawn,
{
    /// Submit a request. Never waits; the outcome is delivered through the
    /// request itself.
    ///
    /// A full wait queue fails the request with [`RequestError::QueueFull`].
    /// Submitting the same request twice is an error.
    pub fn submit(&self, request: RequestLifecycle) -> Result<(), PoolError> {
        let now = self.shared.clock.now();
        let request_id = request.id();
        if !request.mark_submitted(now) {
            return Err(PoolError::AlreadySubmitted(request_id));
        }

        let max_queue_len = self.shared.limits.max_queue_len;
        let admission = self
            .shared
            .with_state(|state| state.submit(now, request_id, max_queue_len));

        let ticket = match admission {
            Admission::Rejected { queue_len } => {
                tracing::warn!(
                    "request {} rejected: queue full (depth={})",
                    request_id,
                    queue_len
                );
                request.fail(RequestError::QueueFull {
                    pool: self.name.clone(),
                    max_queue_len: self.shared.limits.max_queue_len,
                });
                return Ok(());
            }
            Admission::Granted(slot) => {
                tracing::debug!("request {} admitted immediately on slot {}", request_id, slot);
                Ticket::Ready(SlotLease::new(&self.shared, slot, request_id))
            }
            Admission::Queued(granted) => {
                tracing::debug!("request {} queued", request_id);
                Ticket::Waiting(granted)
            }
        };

        if let Some(after) = request.timeout().or(self.shared.limits.request_timeout) {
            let deadline = tokio::time::Instant::now() + after;
            self.spawner.spawn(Arc::clone(&self.shared).expire_at(
                request.clone(),
                deadline,
                after,
            ));
        }
        self.spawner
            .spawn(Arc::clone(&self.shared).serve(request, ticket));
        Ok(())
    }
}

impl<S> fmt::Display for ElasticPool<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.status(), f)
    }
}

//! Core pool abstractions: admission, capacity bookkeeping, request outcomes,
//! usage accounting and telemetry.

pub mod capacity;
pub mod elastic_pool;
pub mod error;
pub mod events;
pub mod request;
pub mod telemetry;
pub mod usage;

pub use capacity::{CapacityChange, CapacityPlan, Resize};
pub use elastic_pool::{ElasticPool, PoolLimits, PoolStatus, Spawn};
pub use error::{AppResult, PoolError, RequestError};
pub use events::{
    build_pool_event, EventSink, InMemoryEventSink, PoolAction, PoolEvent, SharedEventSink,
    TracingEventSink,
};
pub use request::{Outcome, RequestLifecycle};
pub use telemetry::{PoolTelemetry, QueueDepthSample, RequestLogEntry, TelemetrySnapshot};
pub use usage::{SlotUsageTracker, UsageAccountant, UsageGuard};

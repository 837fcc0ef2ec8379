//! Builders to construct elastic pools from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{FarmConfig, PoolConfig};
use crate::core::{ElasticPool, EventSink, PoolError, PoolLimits, SlotUsageTracker, UsageAccountant};
use crate::util::clock::TokioClock;

/// Fluent constructor for [`ElasticPool`].
///
/// Anything not supplied gets a default: a random `uuid` name, a
/// [`SlotUsageTracker`] and no event sink. The pool always keeps time with a
/// [`TokioClock`] started at build time, since its delays and timeouts sleep
/// on tokio's clock.
pub struct PoolBuilder {
    name: Option<String>,
    limits: PoolLimits,
    usage: Option<Arc<dyn UsageAccountant>>,
    events: Option<Box<dyn EventSink>>,
}

impl PoolBuilder {
    /// Start from runtime limits.
    pub fn new(limits: PoolLimits) -> Self {
        Self {
            name: None,
            limits,
            usage: None,
            events: None,
        }
    }

    /// Start from a named pool configuration.
    pub fn from_config(name: impl Into<String>, config: &PoolConfig) -> Self {
        Self::new(config.limits()).name(name)
    }

    /// Pool name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Usage accountant collaborator.
    #[must_use]
    pub fn usage(mut self, usage: Arc<dyn UsageAccountant>) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Sink receiving every pool event.
    #[must_use]
    pub fn events(mut self, sink: impl EventSink + 'static) -> Self {
        self.events = Some(Box::new(sink));
        self
    }

    /// Limits the pool will be built with.
    pub const fn limits(&self) -> &PoolLimits {
        &self.limits
    }

    /// Validate and assemble the pool.
    pub fn build<S>(self, spawner: S) -> Result<ElasticPool<S>, PoolError> {
        let clock = TokioClock::start();
        let usage: Arc<dyn UsageAccountant> = match self.usage {
            Some(usage) => usage,
            None => Arc::new(SlotUsageTracker::new(Arc::new(clock))),
        };
        let name = self
            .name
            .unwrap_or_else(|| format!("pool-{}", uuid::Uuid::new_v4()));
        ElasticPool::from_parts(name, self.limits, spawner, clock, usage, self.events)
    }
}

/// Build one pool per configured entry, all spawning on `spawner`.
pub fn build_pools<S>(cfg: &FarmConfig, spawner: S) -> Result<HashMap<String, ElasticPool<S>>, PoolError>
where
    S: Clone,
{
    cfg.validate()
        .map_err(|e| PoolError::InvalidConfig(format!("config invalid: {e}")))?;

    let mut pools = HashMap::new();
    for (name, pool_cfg) in &cfg.pools {
        let pool = PoolBuilder::from_config(name.clone(), pool_cfg).build(spawner.clone())?;
        tracing::info!("built pool {} with {} slots", name, pool_cfg.capacity);
        pools.insert(name.clone(), pool);
    }

    Ok(pools)
}

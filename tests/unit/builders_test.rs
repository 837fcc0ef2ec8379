//! Tests for builder modules

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use elastic_farm::builders::{build_pools, PoolBuilder};
use elastic_farm::config::{FarmConfig, PoolConfig};
use elastic_farm::core::{PoolError, PoolLimits, SlotUsageTracker, UsageAccountant};
use elastic_farm::runtime::TokioSpawner;
use elastic_farm::util::ManualClock;

#[test]
fn test_pool_builder_from_config() {
    let config = PoolConfig {
        capacity: 4,
        max_queue_len: 10,
        request_timeout_ms: Some(500),
    };

    let builder = PoolBuilder::from_config("vpm-0", &config);
    assert_eq!(builder.limits().capacity, 4);
    assert_eq!(builder.limits().max_queue_len, 10);
    assert_eq!(
        builder.limits().request_timeout,
        Some(Duration::from_millis(500))
    );
}

#[tokio::test(start_paused = true)]
async fn test_pool_builder_defaults() {
    let pool = PoolBuilder::new(PoolLimits::new(2, 3))
        .build(TokioSpawner::current().unwrap())
        .unwrap();
    assert!(pool.name().starts_with("pool-"));
    assert_eq!(pool.capacity(), 2);
    assert_eq!(pool.effective_capacity(), 2);
    assert_eq!(pool.max_queue_len(), 3);
    assert_eq!(pool.active_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_pool_builder_custom_usage_accountant() {
    let clock = Arc::new(ManualClock::new());
    let tracker = Arc::new(SlotUsageTracker::new(clock.clone()));
    let pool = PoolBuilder::new(PoolLimits::new(2, 1))
        .name("metered")
        .usage(tracker.clone())
        .build(TokioSpawner::current().unwrap())
        .unwrap();

    // The pool reported its initial capacity to the injected accountant.
    {
        let _busy = tracker.record_usage(0);
        clock.set(Duration::from_secs(5));
    }
    clock.set(Duration::from_secs(10));
    assert!((pool.usage_in_window(Duration::from_secs(10)) - 0.25).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_pool_builder_keeps_tokio_time() {
    tokio::time::sleep(Duration::from_secs(30)).await;
    let pool = PoolBuilder::new(PoolLimits::new(1, 1))
        .build(TokioSpawner::current().unwrap())
        .unwrap();
    assert_eq!(pool.now(), Duration::ZERO);
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(pool.now(), Duration::from_secs(4));
}

#[test]
fn test_pool_builder_rejects_invalid_limits() {
    let err = PoolBuilder::new(PoolLimits::new(0, 3))
        .build(())
        .err()
        .unwrap();
    assert_eq!(err, PoolError::InvalidCapacity(0));

    let err = PoolBuilder::new(PoolLimits::new(1, 0))
        .build(())
        .err()
        .unwrap();
    assert!(matches!(err, PoolError::InvalidConfig(_)));
}

#[tokio::test(start_paused = true)]
async fn test_build_pools() {
    let mut pools = HashMap::new();
    pools.insert(
        "small".to_string(),
        PoolConfig {
            capacity: 1,
            max_queue_len: 2,
            request_timeout_ms: None,
        },
    );
    pools.insert(
        "large".to_string(),
        PoolConfig {
            capacity: 8,
            max_queue_len: 20,
            request_timeout_ms: None,
        },
    );
    let cfg = FarmConfig { pools };

    let built = build_pools(&cfg, TokioSpawner::current().unwrap()).unwrap();
    assert_eq!(built.len(), 2);
    assert_eq!(built["small"].capacity(), 1);
    assert_eq!(built["large"].capacity(), 8);
    assert_eq!(built["large"].name(), "large");
}

#[test]
fn test_build_pools_rejects_empty_config() {
    let cfg = FarmConfig {
        pools: HashMap::new(),
    };
    assert!(matches!(
        build_pools(&cfg, ()),
        Err(PoolError::InvalidConfig(_))
    ));
}

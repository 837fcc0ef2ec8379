//! Tests for configuration validation

use std::time::Duration;

use elastic_farm::config::{FarmConfig, PoolConfig};

fn pool(capacity: u32, max_queue_len: usize) -> PoolConfig {
    PoolConfig {
        capacity,
        max_queue_len,
        request_timeout_ms: None,
    }
}

#[test]
fn test_pool_config_validation() {
    assert!(pool(4, 10).validate().is_ok());
}

#[test]
fn test_pool_config_invalid_capacity() {
    assert!(pool(0, 10).validate().is_err());
}

#[test]
fn test_pool_config_invalid_queue_len() {
    assert!(pool(4, 0).validate().is_err());
}

#[test]
fn test_pool_config_invalid_timeout() {
    let mut cfg = pool(4, 10);
    cfg.request_timeout_ms = Some(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_pool_config_limits() {
    let mut cfg = pool(4, 10);
    assert_eq!(cfg.limits().request_timeout, None);

    cfg.request_timeout_ms = Some(1500);
    let limits = cfg.limits();
    assert_eq!(limits.capacity, 4);
    assert_eq!(limits.max_queue_len, 10);
    assert_eq!(limits.request_timeout, Some(Duration::from_millis(1500)));
}

#[test]
fn test_farm_config_validation() {
    let mut pools = std::collections::HashMap::new();
    pools.insert("vpm-0".to_string(), pool(4, 10));

    let config = FarmConfig { pools };
    assert!(config.validate().is_ok());
}

#[test]
fn test_farm_config_empty_pools() {
    let config = FarmConfig {
        pools: std::collections::HashMap::new(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_farm_config_reports_invalid_pool() {
    let mut pools = std::collections::HashMap::new();
    pools.insert("broken".to_string(), pool(0, 10));
    let err = FarmConfig { pools }.validate().unwrap_err();
    assert!(err.contains("broken"));
}

#[test]
fn test_farm_config_from_json() {
    let json = r#"{
        "pools": {
            "vpm-0": { "capacity": 4, "max_queue_len": 10 },
            "vpm-1": { "capacity": 2, "max_queue_len": 5, "request_timeout_ms": 3000 }
        }
    }"#;

    let config = FarmConfig::from_json_str(json).unwrap();
    assert_eq!(config.pools.len(), 2);
    assert_eq!(config.pools["vpm-1"].request_timeout_ms, Some(3000));
}

#[test]
fn test_farm_config_from_json_rejects_invalid() {
    let json = r#"{ "pools": { "vpm-0": { "capacity": 0, "max_queue_len": 10 } } }"#;
    assert!(FarmConfig::from_json_str(json).is_err());
    assert!(FarmConfig::from_json_str("not json").is_err());
}

#[test]
fn test_pool_config_from_env() {
    use elastic_farm::config::pool::{ENV_CAPACITY, ENV_MAX_QUEUE_LEN, ENV_REQUEST_TIMEOUT_MS};

    std::env::set_var(ENV_CAPACITY, "6");
    std::env::set_var(ENV_MAX_QUEUE_LEN, "12");
    std::env::remove_var(ENV_REQUEST_TIMEOUT_MS);
    let cfg = PoolConfig::from_env().unwrap();
    assert_eq!(cfg, pool(6, 12));

    std::env::set_var(ENV_REQUEST_TIMEOUT_MS, "250");
    let cfg = PoolConfig::from_env().unwrap();
    assert_eq!(cfg.limits().request_timeout, Some(Duration::from_millis(250)));

    std::env::set_var(ENV_CAPACITY, "many");
    let err = PoolConfig::from_env().unwrap_err();
    assert!(err.to_string().contains(ENV_CAPACITY));

    std::env::set_var(ENV_CAPACITY, "0");
    assert!(PoolConfig::from_env().is_err());

    std::env::remove_var(ENV_CAPACITY);
    std::env::remove_var(ENV_MAX_QUEUE_LEN);
    std::env::remove_var(ENV_REQUEST_TIMEOUT_MS);
    assert!(PoolConfig::from_env().is_err());
}

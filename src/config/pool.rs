//! Pool and farm configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, PoolLimits};

/// Environment variable holding the slot count.
pub const ENV_CAPACITY: &str = "FARM_CAPACITY";
/// Environment variable holding the wait queue bound.
pub const ENV_MAX_QUEUE_LEN: &str = "FARM_MAX_QUEUE_LEN";
/// Environment variable holding the optional request timeout in milliseconds.
pub const ENV_REQUEST_TIMEOUT_MS: &str = "FARM_REQUEST_TIMEOUT_MS";

/// Configuration of one elastic pool ("physical machine").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Initial number of slots ("virtual machines").
    pub capacity: u32,
    /// Maximum requests waiting for a slot before rejection.
    pub max_queue_len: usize,
    /// Default request timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

/// Root configuration: a set of named pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmConfig {
    /// Map of pool name to configuration.
    pub pools: HashMap<String, PoolConfig>,
}

impl PoolConfig {
    /// Validate pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        if self.max_queue_len == 0 {
            return Err("max_queue_len must be greater than 0".into());
        }
        if self.request_timeout_ms == Some(0) {
            return Err("request_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Runtime limits described by this configuration.
    pub fn limits(&self) -> PoolLimits {
        let limits = PoolLimits::new(self.capacity, self.max_queue_len);
        match self.request_timeout_ms {
            Some(ms) => limits.with_request_timeout(Duration::from_millis(ms)),
            None => limits,
        }
    }

    /// Read a pool configuration from the environment, loading `.env` first
    /// when present.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let capacity = std::env::var(ENV_CAPACITY)
            .with_context(|| format!("{ENV_CAPACITY} is not set"))?
            .parse::<u32>()
            .with_context(|| format!("{ENV_CAPACITY} must be a positive integer"))?;
        let max_queue_len = std::env::var(ENV_MAX_QUEUE_LEN)
            .with_context(|| format!("{ENV_MAX_QUEUE_LEN} is not set"))?
            .parse::<usize>()
            .with_context(|| format!("{ENV_MAX_QUEUE_LEN} must be a positive integer"))?;
        let request_timeout_ms = match std::env::var(ENV_REQUEST_TIMEOUT_MS) {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("{ENV_REQUEST_TIMEOUT_MS} must be an integer"))?,
            ),
            Err(_) => None,
        };

        let cfg = Self {
            capacity,
            max_queue_len,
            request_timeout_ms,
        };
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

impl FarmConfig {
    /// Validate all pools and ensure at least one pool exists.
    pub fn validate(&self) -> Result<(), String> {
        if self.pools.is_empty() {
            return Err("at least one pool must be defined".into());
        }
        for (name, pool) in &self.pools {
            pool.validate()
                .map_err(|e| format!("pool `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse farm configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

//! Configuration models for pools and farms.

pub mod pool;

pub use pool::{FarmConfig, PoolConfig};

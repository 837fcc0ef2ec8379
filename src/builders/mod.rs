//! Builders to construct pools from limits or configuration.

pub mod pool_builder;

pub use pool_builder::{build_pools, PoolBuilder};

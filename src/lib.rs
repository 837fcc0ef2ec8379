//! # Elastic Farm
//!
//! A discrete-event model of an elastic pool of compute slots ("virtual
//! machines") that serves jobs through a bounded FIFO admission queue and a
//! capacity that can be resized while the pool is running.
//!
//! ## Core Problem Solved
//!
//! Capacity planning for request-serving farms needs to answer questions like
//! "what happens to queueing and rejections if we scale this machine from 4 to
//! 8 VMs at t=30s, and back down at t=60s?" without running real
//! infrastructure. This crate models exactly the parts that make that
//! interesting:
//!
//! - **Bounded admission**: a request that arrives while the wait queue is at
//!   its bound fails with `QueueFull` on its own outcome; the submitter is
//!   never interrupted.
//! - **FIFO fairness**: waiting requests are granted slots strictly in arrival
//!   order.
//! - **Immediate growth**: adding slots admits waiting requests at the same
//!   simulated instant.
//! - **Deferred shrink**: removing slots never evicts running work; surplus
//!   slots are withheld as they are released.
//! - **Telemetry**: submission, failure and queue-depth logs stamped with
//!   simulated time, plus windowed utilization.
//!
//! ## Simulated Time
//!
//! Pools run on tokio. Drive them from a current-thread runtime with its clock
//! paused ([`runtime::simulation_runtime`] or
//! `#[tokio::test(start_paused = true)]`); the clock then jumps from event to
//! event and a simulated hour takes microseconds.
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use elastic_farm::core::{ElasticPool, PoolLimits, RequestLifecycle};
//! use elastic_farm::runtime::{simulation_runtime, TokioSpawner};
//!
//! let rt = simulation_runtime()?;
//! rt.block_on(async {
//!     let pool = ElasticPool::new("vpm-0", PoolLimits::new(4, 10), TokioSpawner::current()?)?;
//!
//!     let req = RequestLifecycle::new(1, Duration::from_millis(250));
//!     pool.submit(req.clone())?;
//!     pool.set_capacity(8)?;
//!
//!     assert_eq!(req.wait_for_completion().await, Ok(0));
//!     println!("{pool}, usage {:.2}", pool.usage_in_window(Duration::from_secs(1)));
//!     Ok::<_, anyhow::Error>(())
//! })?;
//! ```
//!
//! For complete scenarios, see `tests/elastic_pool_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core pool abstractions and capacity accounting.
pub mod core;
/// Configuration models for pools and farms.
pub mod config;
/// Builders to construct pools from configuration.
pub mod builders;
/// Runtime adapters and the simulation runtime.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{ElasticPool, PoolError, PoolLimits, RequestError, RequestLifecycle};

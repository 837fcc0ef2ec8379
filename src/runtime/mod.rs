//! Runtime adapters: task spawning and the paused-clock simulation runtime.

pub mod simulation;
pub mod tokio_spawner;

pub use simulation::simulation_runtime;
pub use tokio_spawner::TokioSpawner;

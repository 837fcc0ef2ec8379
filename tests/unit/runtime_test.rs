//! Tests for runtime adapters

use std::time::Duration;

use elastic_farm::core::Spawn;
use elastic_farm::runtime::{simulation_runtime, TokioSpawner};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_tokio_spawner_current_outside_runtime() {
    assert!(TokioSpawner::current().is_err());
}

#[test]
fn test_simulation_runtime_starts_paused() {
    let rt = simulation_runtime().unwrap();
    rt.block_on(async {
        let spawner = TokioSpawner::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let start = tokio::time::Instant::now();
        spawner.spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            let _ = tx.send(());
        });
        rx.await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(90));
    });
}

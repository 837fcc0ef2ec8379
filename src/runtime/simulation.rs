//! Discrete-event runtime for driving pools in simulated time.
//!
//! A current-thread tokio runtime with its clock paused: exactly one task runs
//! between suspension points, and whenever every task is idle the clock jumps
//! straight to the next pending timer.

/// Build a single-threaded runtime whose clock starts paused at zero.
pub fn simulation_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn simulated_hours_pass_instantly() {
        let rt = simulation_runtime().unwrap();
        let elapsed = rt.block_on(async {
            let start = tokio::time::Instant::now();
            tokio::time::sleep(Duration::from_secs(3600)).await;
            start.elapsed()
        });
        assert_eq!(elapsed, Duration::from_secs(3600));
    }
}

//! Tracing subscriber setup.

/// Install a fmt subscriber driven by `RUST_LOG`, unless one is already set.
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Install a fmt subscriber, falling back to `default_directive` when
/// `RUST_LOG` is unset or unparsable.
pub fn init_tracing_with_default(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

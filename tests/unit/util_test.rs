//! Tests for utility functions

use std::time::Duration;

use elastic_farm::util::{Clock, ManualClock, RequestId, SlotId};

#[test]
fn test_manual_clock() {
    let clock = ManualClock::new();
    clock.advance(Duration::from_secs(3));
    assert_eq!(clock.now(), Duration::from_secs(3));
}

#[test]
fn test_id_types() {
    let request: RequestId = 12345;
    let slot: SlotId = 3;
    assert_eq!(request, 12345);
    assert_eq!(slot, 3);
}

#[test]
fn test_init_tracing_is_idempotent() {
    elastic_farm::util::init_tracing();
    elastic_farm::util::init_tracing_with_default("debug");
}

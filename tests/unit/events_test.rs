//! Tests for pool event sinks

use std::time::Duration;

use elastic_farm::core::{
    build_pool_event, EventSink, InMemoryEventSink, PoolAction, SharedEventSink, TracingEventSink,
};

#[test]
fn test_in_memory_event_sink() {
    let mut sink = InMemoryEventSink::new(10);

    sink.record(build_pool_event(
        "vpm-0",
        Duration::from_secs(1),
        PoolAction::Submit { request_id: 7 },
    ));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].pool, "vpm-0");
    assert_eq!(events[0].at, Duration::from_secs(1));
    assert_eq!(events[0].action, PoolAction::Submit { request_id: 7 });
}

#[test]
fn test_event_sink_overflow() {
    let mut sink = InMemoryEventSink::new(2);

    for request_id in 1..=3 {
        sink.record(build_pool_event(
            "vpm-0",
            Duration::ZERO,
            PoolAction::Submit { request_id },
        ));
    }

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, PoolAction::Submit { request_id: 2 });
    assert_eq!(events[1].action, PoolAction::Submit { request_id: 3 });
}

#[test]
fn test_zero_sized_sink_keeps_nothing() {
    let mut sink = InMemoryEventSink::new(0);
    sink.record(build_pool_event("p", Duration::ZERO, PoolAction::Expire { request_id: 1 }));
    assert!(sink.events().is_empty());
}

#[test]
fn test_shared_sink_is_observable() {
    let shared = SharedEventSink::new(InMemoryEventSink::new(8));
    let mut handle = shared.clone();
    handle.record(build_pool_event(
        "vpm-0",
        Duration::ZERO,
        PoolAction::Resize {
            target: 2,
            effective: 3,
        },
    ));
    assert_eq!(shared.with(|sink| sink.events().len()), 1);
}

#[test]
fn test_tracing_sink_accepts_events() {
    let mut sink = TracingEventSink;
    sink.record(build_pool_event(
        "vpm-0",
        Duration::ZERO,
        PoolAction::Release {
            request_id: 1,
            slot: 0,
        },
    ));
}

#[test]
fn test_event_json_shape() {
    let event = build_pool_event(
        "vpm-0",
        Duration::from_millis(1500),
        PoolAction::Reject {
            request_id: 3,
            queue_len: 1,
        },
    );
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["pool"], "vpm-0");
    assert_eq!(json["at"], 1.5);
    assert_eq!(json["action"], "reject");
    assert_eq!(json["request_id"], 3);
    assert_eq!(json["queue_len"], 1);
}

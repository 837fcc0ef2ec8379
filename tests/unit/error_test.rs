//! Tests for error types

use std::time::Duration;

use elastic_farm::core::{PoolError, RequestError};

#[test]
fn test_queue_full_error() {
    let err = RequestError::QueueFull {
        pool: "vpm-0".to_string(),
        max_queue_len: 10,
    };
    assert_eq!(
        format!("{}", err),
        "queue full on pool `vpm-0` (max queue length 10)"
    );
}

#[test]
fn test_timed_out_error() {
    let err = RequestError::TimedOut {
        after: Duration::from_secs(2),
    };
    assert_eq!(format!("{}", err), "request timed out after 2s");
}

#[test]
fn test_abandoned_error() {
    assert_eq!(
        format!("{}", RequestError::Abandoned),
        "request abandoned before completion"
    );
}

#[test]
fn test_invalid_capacity_error() {
    let err = PoolError::InvalidCapacity(0);
    assert_eq!(
        format!("{}", err),
        "invalid capacity 0: capacity must be greater than 0"
    );
}

#[test]
fn test_already_submitted_error() {
    let err = PoolError::AlreadySubmitted(42);
    assert_eq!(format!("{}", err), "request 42 was already submitted");
}

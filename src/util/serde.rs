//! Identifier types and serde helpers shared across the crate.

/// Identifier of a submitted request.
pub type RequestId = u64;

/// Index of an allocatable slot ("virtual machine") inside a pool.
pub type SlotId = usize;

/// Serialize a `Duration` as fractional seconds.
///
/// Simulated timestamps read more naturally as `2.5` than as
/// `{"secs":2,"nanos":500000000}` in exported telemetry.
pub mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `f64` seconds.
    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    /// Deserialize from `f64` seconds.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

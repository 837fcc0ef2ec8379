//! Capacity target and realized-capacity history.
//!
//! The target is what the operator last asked for; it gates new admissions.
//! The history records the capacity actually in force over time. Growth is
//! realized at once. A shrink is realized at once only down to the number of
//! busy slots; the rest is realized one step per release, so running work is
//! never evicted.
//!
//! Records are appended in the order they happen and are never rewritten.
//! When several shrinks arrive before a release, the latest target governs
//! and the realized value walks down to it one release at a time. A record
//! never claims a ceiling below the slots that are busy when it is taken.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::PoolError;

/// A realized capacity value and the simulated time it took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityChange {
    /// Time the change took effect.
    #[serde(with = "crate::util::serde::duration_secs")]
    pub at: Duration,
    /// Capacity in force from `at` on.
    pub capacity: u32,
}

/// Result of asking for a new capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    /// Capacity grew; waiters may be admitted right away.
    Grown(CapacityChange),
    /// Idle headroom existed; the shrink took effect at once (possibly only
    /// partially, down to the busy slot count).
    Shrunk(CapacityChange),
    /// Every slot was busy; the shrink is realized as slots are released.
    /// Also returned when a pending shrink's target is raised but stays at or
    /// below the busy slot count.
    Deferred,
    /// The capacity in force and the pending work are unaffected.
    Unchanged,
}

/// Capacity bookkeeping for one pool.
#[derive(Debug, Clone)]
pub struct CapacityPlan {
    target: u32,
    history: Vec<CapacityChange>,
}

impl CapacityPlan {
    /// Start with `initial` capacity in force at `at`.
    pub fn new(initial: u32, at: Duration) -> Result<Self, PoolError> {
        if initial == 0 {
            return Err(PoolError::InvalidCapacity(initial));
        }
        Ok(Self {
            target: initial,
            history: vec![CapacityChange {
                at,
                capacity: initial,
            }],
        })
    }

    /// Nominal capacity most recently requested.
    pub const fn target(&self) -> u32 {
        self.target
    }

    /// Capacity actually in force, including unrealized shrink steps.
    pub fn effective(&self) -> u32 {
        self.history.last().map_or(self.target, |c| c.capacity)
    }

    /// Whether a new request may take a slot with `active` slots busy.
    pub const fn has_headroom(&self, active: u32) -> bool {
        active < self.target
    }

    /// Realized changes in the order they took effect.
    pub fn history(&self) -> &[CapacityChange] {
        &self.history
    }

    /// Request a new target capacity with `active` slots currently busy.
    pub fn resize(&mut self, new_capacity: u32, active: u32, at: Duration) -> Result<Resize, PoolError> {
        if new_capacity == 0 {
            return Err(PoolError::InvalidCapacity(new_capacity));
        }
        let previous = self.target;
        self.target = new_capacity;

        // Effective capacity is always max(target, active).
        let realized = new_capacity.max(active);
        if realized == self.effective() {
            return Ok(if active > new_capacity {
                Resize::Deferred
            } else {
                Resize::Unchanged
            });
        }
        let change = self.push(at, realized);
        if new_capacity > previous {
            Ok(Resize::Grown(change))
        } else {
            Ok(Resize::Shrunk(change))
        }
    }

    /// Account for one slot about to be released while `active` are busy.
    ///
    /// Returns the realized shrink step, if one was pending.
    pub fn on_release(&mut self, active: u32, at: Duration) -> Option<CapacityChange> {
        if active > self.target {
            Some(self.push(at, active - 1))
        } else {
            None
        }
    }

    fn push(&mut self, at: Duration, capacity: u32) -> CapacityChange {
        let change = CapacityChange { at, capacity };
        self.history.push(change);
        change
    }
}

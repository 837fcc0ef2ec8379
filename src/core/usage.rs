//! Per-slot busy-time accounting.
//!
//! The pool marks a slot busy for the whole time a request executes on it and
//! reports every realized capacity change, so utilization is measured against
//! the capacity that was actually available.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::CapacityChange;
use crate::util::clock::Clock;
use crate::util::serde::SlotId;

/// Scoped busy marker returned by [`UsageAccountant::record_usage`].
///
/// The marker ends when the guard is dropped, including during unwinding.
#[must_use = "the slot stops being counted busy as soon as the guard is dropped"]
pub struct UsageGuard {
    finish: Option<Box<dyn FnOnce() + Send>>,
}

impl UsageGuard {
    /// Guard that runs `finish` when dropped.
    pub fn new(finish: impl FnOnce() + Send + 'static) -> Self {
        Self {
            finish: Some(Box::new(finish)),
        }
    }
}

impl Drop for UsageGuard {
    fn drop(&mut self) {
        if let Some(finish) = self.finish.take() {
            finish();
        }
    }
}

/// Busy-time accounting collaborator of a pool.
pub trait UsageAccountant: Send + Sync {
    /// Mark `slot` busy until the returned guard is dropped.
    fn record_usage(&self, slot: SlotId) -> UsageGuard;

    /// Busy fraction of the available capacity over the trailing `window`,
    /// in `[0, 1]`.
    fn usage_in_window(&self, window: Duration) -> f64;

    /// Observe a realized capacity change.
    fn capacity_changed(&self, _change: CapacityChange) {}
}

#[derive(Debug, Clone, Copy)]
struct BusyInterval {
    start: Duration,
    end: Option<Duration>,
}

#[derive(Debug, Default)]
struct UsageLedger {
    busy: HashMap<SlotId, Vec<BusyInterval>>,
    capacity: Vec<CapacityChange>,
}

impl UsageLedger {
    fn open(&mut self, slot: SlotId, at: Duration) {
        self.busy.entry(slot).or_default().push(BusyInterval {
            start: at,
            end: None,
        });
    }

    fn close(&mut self, slot: SlotId, at: Duration) {
        if let Some(open) = self
            .busy
            .get_mut(&slot)
            .and_then(|intervals| intervals.iter_mut().rev().find(|i| i.end.is_none()))
        {
            open.end = Some(at);
        }
    }

    fn busy_time(&self, from: Duration, to: Duration) -> Duration {
        self.busy
            .values()
            .flatten()
            .map(|interval| overlap(interval.start, interval.end.unwrap_or(to), from, to))
            .sum()
    }

    /// Integral of realized capacity over `[from, to]`, in slot-seconds.
    fn capacity_time(&self, from: Duration, to: Duration) -> f64 {
        let mut total = 0.0;
        for (i, change) in self.capacity.iter().enumerate() {
            let until = self.capacity.get(i + 1).map_or(to, |next| next.at);
            let span = overlap(change.at, until, from, to);
            total += span.as_secs_f64() * f64::from(change.capacity);
        }
        total
    }
}

fn overlap(start: Duration, end: Duration, from: Duration, to: Duration) -> Duration {
    let lo = start.max(from);
    let hi = end.min(to);
    hi.saturating_sub(lo)
}

/// In-memory [`UsageAccountant`] that keeps every busy interval.
#[derive(Clone)]
pub struct SlotUsageTracker {
    ledger: Arc<Mutex<UsageLedger>>,
    clock: Arc<dyn Clock>,
}

impl SlotUsageTracker {
    /// Create a tracker reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(UsageLedger::default())),
            clock,
        }
    }

    /// Total busy time recorded for `slot` up to now.
    pub fn busy_time(&self, slot: SlotId) -> Duration {
        let now = self.clock.now();
        let ledger = self.ledger.lock();
        ledger.busy.get(&slot).map_or(Duration::ZERO, |intervals| {
            intervals
                .iter()
                .map(|i| i.end.unwrap_or(now).saturating_sub(i.start))
                .sum()
        })
    }

    /// Slots currently marked busy.
    pub fn busy_slots(&self) -> usize {
        let ledger = self.ledger.lock();
        ledger
            .busy
            .values()
            .filter(|intervals| intervals.iter().any(|i| i.end.is_none()))
            .count()
    }
}

impl UsageAccountant for SlotUsageTracker {
    fn record_usage(&self, slot: SlotId) -> UsageGuard {
        self.ledger.lock().open(slot, self.clock.now());
        let ledger = Arc::clone(&self.ledger);
        let clock = Arc::clone(&self.clock);
        UsageGuard::new(move || ledger.lock().close(slot, clock.now()))
    }

    fn usage_in_window(&self, window: Duration) -> f64 {
        if window.is_zero() {
            return 0.0;
        }
        let to = self.clock.now();
        let from = to.saturating_sub(window);
        let ledger = self.ledger.lock();
        let available = ledger.capacity_time(from, to);
        if available <= 0.0 {
            return 0.0;
        }
        (ledger.busy_time(from, to).as_secs_f64() / available).clamp(0.0, 1.0)
    }

    fn capacity_changed(&self, change: CapacityChange) {
        self.ledger.lock().capacity.push(change);
    }
}

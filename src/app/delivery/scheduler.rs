//! Host scheduler capability
//!
//! webfile never runs its own timer. It asks the host to start (and, when
//! enabled, stop) calling [`WebFile::tick`](crate::app::WebFile::tick) on the
//! main context at a fixed interval.

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

/// Periodic-tick scheduling provided by the host
pub trait TickScheduler: Send + Sync + Debug {
    /// Begin invoking the tick entry point every `interval`
    fn schedule_repeating(&self, interval: Duration);

    /// Stop invoking the tick entry point
    fn cancel(&self);
}

/// Scheduler for hosts that run their own loop
///
/// Records whether ticking was requested and at what interval; the host reads
/// [`is_active`](Self::is_active) and [`interval`](Self::interval) from its
/// loop and calls `tick` accordingly.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    interval: Mutex<Option<Duration>>,
    schedule_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the coordinator currently wants to be ticked
    pub fn is_active(&self) -> bool {
        self.interval.lock().is_some()
    }

    /// Requested tick interval, if active
    pub fn interval(&self) -> Option<Duration> {
        *self.interval.lock()
    }

    /// Number of times ticking was requested
    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::Acquire)
    }

    /// Number of times ticking was cancelled
    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::Acquire)
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration) {
        *self.interval.lock() = Some(interval);
        self.schedule_calls.fetch_add(1, Ordering::AcqRel);
    }

    fn cancel(&self) {
        *self.interval.lock() = None;
        self.cancel_calls.fetch_add(1, Ordering::AcqRel);
    }
}

//! Pending-operation counter that drives mailbox polling
//!
//! Every operation that will eventually post exactly one mailbox entry is
//! counted when it starts and uncounted when its entry is drained. The first
//! operation asks the host scheduler to start ticking. Returning to zero does
//! not stop the schedule unless `stop_when_idle` is enabled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::config::PollConfig;
use super::scheduler::TickScheduler;

/// Tracks outstanding operations and the host schedule
#[derive(Debug)]
pub struct PollController {
    pending: AtomicUsize,
    /// Held across every call into the scheduler
    scheduled: Mutex<bool>,
    scheduler: Arc<dyn TickScheduler>,
    config: PollConfig,
}

impl PollController {
    pub fn new(scheduler: Arc<dyn TickScheduler>, config: PollConfig) -> Self {
        Self {
            pending: AtomicUsize::new(0),
            scheduled: Mutex::new(false),
            scheduler,
            config,
        }
    }

    /// Count an operation that will post one mailbox entry
    pub fn note_operation_started(&self) {
        let previous = self.pending.fetch_add(1, Ordering::AcqRel);
        if previous == 0 {
            self.ensure_scheduled();
        }
    }

    /// Uncount an operation whose mailbox entry was just delivered
    pub fn note_operation_finished(&self) {
        let previous = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.on_idle(),
            Ok(_) => {}
            Err(_) => warn!("Pending operation count would drop below zero, ignoring"),
        }
    }

    /// Number of operations whose entry has not been drained yet
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether the host has been asked to tick
    pub fn is_scheduled(&self) -> bool {
        *self.scheduled.lock()
    }

    fn ensure_scheduled(&self) {
        let mut scheduled = self.scheduled.lock();
        if !*scheduled {
            debug!(
                "Requesting mailbox polling every {:?}",
                self.config.tick_interval
            );
            self.scheduler.schedule_repeating(self.config.tick_interval);
            *scheduled = true;
        }
    }

    fn on_idle(&self) {
        if !self.config.stop_when_idle {
            trace!("No pending operations; polling stays active");
            return;
        }

        let mut scheduled = self.scheduled.lock();
        // An operation started after the count reached zero owns the schedule
        if *scheduled && self.pending() == 0 {
            debug!("No pending operations; cancelling mailbox polling");
            self.scheduler.cancel();
            *scheduled = false;
        }
    }
}

//! Cross-thread callback mailbox
//!
//! Workers post `(callback, result)` pairs from any thread; the main context
//! drains them on its tick and is the only place callbacks run. Delivery
//! order is not specified.

use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::{trace, warn};

use super::poll::PollController;

/// Completion callback handed to `get` and `clear_storage`
pub type Callback = Box<dyn FnOnce(bool) + Send + 'static>;

/// A posted completion waiting for the main context
pub struct MailboxEntry {
    callback: Callback,
    result: bool,
}

impl MailboxEntry {
    pub fn new(callback: Callback, result: bool) -> Self {
        Self { callback, result }
    }

    pub fn result(&self) -> bool {
        self.result
    }

    fn deliver(self) {
        (self.callback)(self.result);
    }
}

impl fmt::Debug for MailboxEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailboxEntry")
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// Uncounts one delivered entry, even when its callback unwinds
struct FinishOnDrop<'a>(&'a PollController);

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        self.0.note_operation_finished();
    }
}

/// Queue of completions drained on the main context
#[derive(Debug)]
pub struct Mailbox {
    queue: Mutex<Vec<MailboxEntry>>,
    poll: Arc<PollController>,
    main_thread: OnceLock<ThreadId>,
}

impl Mailbox {
    pub fn new(poll: Arc<PollController>) -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            poll,
            main_thread: OnceLock::new(),
        }
    }

    /// Queue a completion. Safe from any thread; never runs the callback.
    pub fn post(&self, callback: Callback, result: bool) {
        self.queue.lock().push(MailboxEntry::new(callback, result));
        trace!("Posted completion (result: {})", result);
    }

    /// Number of completions waiting to be drained
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Deliver every queued completion on the calling thread
    ///
    /// The first thread to drain becomes the main context; later drains from
    /// any other thread deliver nothing. The lock is released while each
    /// callback runs, so callbacks may call back into the coordinator.
    /// Entries posted during the drain are picked up by the same loop.
    ///
    /// Returns the number of callbacks invoked.
    pub fn drain(&self) -> usize {
        let current = thread::current().id();
        let owner = *self.main_thread.get_or_init(|| current);
        if owner != current {
            warn!(
                "Mailbox drain refused on {:?}; main context is {:?}",
                current, owner
            );
            return 0;
        }

        let mut delivered = 0;
        loop {
            let next = self.queue.lock().pop();
            let Some(entry) = next else {
                break;
            };
            let _finished = FinishOnDrop(&self.poll);
            entry.deliver();
            delivered += 1;
        }

        if delivered > 0 {
            trace!("Delivered {} completions", delivered);
        }
        delivered
    }
}

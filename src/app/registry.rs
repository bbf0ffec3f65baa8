//! In-flight download registry
//!
//! Keyed by destination path. A key is present exactly while a transfer for
//! it is running, and its entry holds every callback waiting on that
//! transfer, the one of the request that started it first. Completion removes
//! the key and takes its waiters under the same lock, so a request arriving
//! afterwards never joins a finished transfer.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::app::delivery::{Callback, Mailbox};

/// Outcome of [`DedupRegistry::request_download`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Key recorded as in flight; the caller must start the transfer
    Fresh,
    /// A transfer is already running; the callback joined its waiters
    Duplicate,
}

/// Outcome of [`DedupRegistry::reserve`]
pub enum Reservation {
    /// Destination already on disk and nothing in flight. The callback is
    /// handed back untouched for the caller to invoke.
    AlreadyExists(Callback),
    /// Key recorded as in flight; the caller must start the transfer
    Fresh,
    /// Joined a running transfer as waiter number `waiters`
    Duplicate { waiters: usize },
}

impl fmt::Debug for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reservation::AlreadyExists(_) => f.write_str("AlreadyExists"),
            Reservation::Fresh => f.write_str("Fresh"),
            Reservation::Duplicate { waiters } => f
                .debug_struct("Duplicate")
                .field("waiters", waiters)
                .finish(),
        }
    }
}

/// Destination path -> callbacks waiting on its transfer
#[derive(Default)]
pub struct DedupRegistry {
    in_flight: Mutex<HashMap<PathBuf, Vec<Callback>>>,
}

impl fmt::Debug for DedupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupRegistry")
            .field("in_flight", &self.in_flight.lock().len())
            .finish()
    }
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `key` without an existence probe
    pub fn request_download(&self, key: &Path, callback: Callback) -> RequestOutcome {
        match self.reserve(key, callback, |_| false, || {}) {
            Reservation::Fresh => RequestOutcome::Fresh,
            Reservation::Duplicate { .. } => RequestOutcome::Duplicate,
            Reservation::AlreadyExists(_) => unreachable!("existence probe always reports missing"),
        }
    }

    /// Register interest in `key`
    ///
    /// Under one lock: if a transfer is in flight the callback joins it;
    /// otherwise `file_exists` is consulted and either the callback is handed
    /// back ([`Reservation::AlreadyExists`]) or the key is recorded as in
    /// flight. `on_admitted` runs, still under the lock, whenever the
    /// callback was stored, so accounting for it cannot race its delivery.
    pub fn reserve<E, A>(
        &self,
        key: &Path,
        callback: Callback,
        file_exists: E,
        on_admitted: A,
    ) -> Reservation
    where
        E: FnOnce(&Path) -> bool,
        A: FnOnce(),
    {
        let mut in_flight = self.in_flight.lock();

        if let Some(waiters) = in_flight.get_mut(key) {
            waiters.push(callback);
            on_admitted();
            debug!(
                "Joined in-flight download of {} ({} waiters)",
                key.display(),
                waiters.len()
            );
            return Reservation::Duplicate {
                waiters: waiters.len(),
            };
        }

        if file_exists(key) {
            debug!("Already on disk: {}", key.display());
            return Reservation::AlreadyExists(callback);
        }

        in_flight.insert(key.to_path_buf(), vec![callback]);
        on_admitted();
        debug!("Reserved {} for download", key.display());
        Reservation::Fresh
    }

    /// Finish the transfer for `key` and post `succeeded` to all its waiters
    ///
    /// Returns how many callbacks were posted.
    pub fn complete_download(&self, key: &Path, succeeded: bool, mailbox: &Mailbox) -> usize {
        let waiters = self.in_flight.lock().remove(key);

        let Some(waiters) = waiters else {
            warn!("Completion for {} which was not in flight", key.display());
            return 0;
        };

        let count = waiters.len();
        for callback in waiters {
            mailbox.post(callback, succeeded);
        }
        debug!(
            "Completed {} (success: {}), notified {} waiters",
            key.display(),
            succeeded,
            count
        );
        count
    }

    /// Whether a transfer for `key` is running
    pub fn is_in_flight(&self, key: &Path) -> bool {
        self.in_flight.lock().contains_key(key)
    }

    /// Number of destinations currently downloading
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Callbacks waiting on `key`, including the one that started it
    pub fn waiter_count(&self, key: &Path) -> usize {
        self.in_flight.lock().get(key).map_or(0, Vec::len)
    }
}

//! Download coordination facade
//!
//! [`WebFile`] is the single coordination point a host creates once and
//! shares as `Arc<WebFile>`. It de-duplicates requests per destination path,
//! runs transfers as detached tasks on a tokio runtime, and hands results back
//! through the mailbox so that callbacks only ever run inside [`WebFile::tick`]
//! on the host's main context.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use webfile::app::{ManualScheduler, PollConfig, WebFile};
//! use webfile::app::client::ClientConfig;
//!
//! # async fn example() {
//! let scheduler = Arc::new(ManualScheduler::new());
//! let webfile = WebFile::with_client_config(
//!     tokio::runtime::Handle::current(),
//!     scheduler.clone(),
//!     ClientConfig::default(),
//!     PollConfig::default(),
//! );
//!
//! webfile.get("https://example.com/a.bin", "/tmp/a.bin", |ok| {
//!     println!("a.bin downloaded: {}", ok);
//! });
//!
//! // Host main loop
//! while webfile.pending_operations() > 0 {
//!     if let Some(interval) = scheduler.interval() {
//!         tokio::time::sleep(interval).await;
//!         webfile.tick(interval);
//!     }
//! }
//! # }
//! ```

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::{debug, error, info, trace};

use crate::app::client::{ClientConfig, HttpFetcher, ReqwestFetcher, TransferExecutor};
use crate::app::delivery::{ClearingPolicy, Mailbox, PollConfig, PollController, TickScheduler};
use crate::app::registry::{DedupRegistry, Reservation};

/// Shared state created on first use
#[derive(Debug)]
struct Core {
    registry: DedupRegistry,
    mailbox: Mailbox,
    poll: Arc<PollController>,
    clearing: AtomicBool,
}

impl Core {
    fn new(scheduler: Arc<dyn TickScheduler>, config: PollConfig) -> Self {
        let poll = Arc::new(PollController::new(scheduler, config));
        Self {
            registry: DedupRegistry::new(),
            mailbox: Mailbox::new(Arc::clone(&poll)),
            poll,
            clearing: AtomicBool::new(false),
        }
    }
}

/// Concurrent download coordinator
///
/// One instance per host process. Create it with [`WebFile::new`] and clone
/// the returned `Arc` into every call site.
#[derive(Debug)]
pub struct WebFile {
    runtime: Handle,
    scheduler: Arc<dyn TickScheduler>,
    executor: TransferExecutor,
    config: PollConfig,
    core: OnceLock<Arc<Core>>,
}

impl WebFile {
    /// Create a coordinator
    ///
    /// # Arguments
    ///
    /// * `runtime` - runtime that transfer tasks are spawned on
    /// * `scheduler` - host scheduler asked to start ticking
    /// * `fetcher` - HTTP capability used by every transfer
    /// * `config` - polling configuration
    pub fn new(
        runtime: Handle,
        scheduler: Arc<dyn TickScheduler>,
        fetcher: Arc<dyn HttpFetcher>,
        config: PollConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            runtime,
            scheduler,
            executor: TransferExecutor::new(fetcher),
            config,
            core: OnceLock::new(),
        })
    }

    /// Create a coordinator backed by a reqwest client built from `client_config`
    pub fn with_client_config(
        runtime: Handle,
        scheduler: Arc<dyn TickScheduler>,
        client_config: ClientConfig,
        config: PollConfig,
    ) -> Arc<Self> {
        Self::new(
            runtime,
            scheduler,
            Arc::new(ReqwestFetcher::new(client_config)),
            config,
        )
    }

    fn core(&self) -> &Arc<Core> {
        self.core.get_or_init(|| {
            debug!("Initializing download coordination state");
            Arc::new(Core::new(Arc::clone(&self.scheduler), self.config.clone()))
        })
    }

    /// Download `url` to `dest_file` and report the outcome to `callback`
    ///
    /// Never blocks. `callback` runs synchronously with `false` while storage
    /// is being cleared, synchronously with `true` when `dest_file` already
    /// exists and nothing is downloading it, and otherwise from a later
    /// [`tick`](Self::tick) once the (possibly shared) transfer has finished.
    pub fn get<F>(&self, url: &str, dest_file: impl AsRef<Path>, callback: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let core = self.core();
        let dest = dest_file.as_ref();

        if core.clearing.load(Ordering::Acquire) {
            debug!("Storage is being cleared; rejecting {}", dest.display());
            callback(false);
            return;
        }

        let reservation = core.registry.reserve(
            dest,
            Box::new(callback),
            |path| path.exists(),
            || core.poll.note_operation_started(),
        );

        match reservation {
            Reservation::AlreadyExists(callback) => callback(true),
            Reservation::Duplicate { waiters } => {
                debug!(
                    "{} is already downloading; queued as waiter {}",
                    dest.display(),
                    waiters
                );
            }
            Reservation::Fresh => {
                self.spawn_transfer(core, url.to_string(), dest.to_path_buf());
            }
        }
    }

    fn spawn_transfer(&self, core: &Arc<Core>, url: String, dest: PathBuf) {
        let core = Arc::clone(core);
        let executor = self.executor.clone();

        self.runtime.spawn(async move {
            let succeeded = AssertUnwindSafe(executor.run(&url, &dest))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    error!("Transfer task for {} panicked", dest.display());
                    false
                });
            core.registry.complete_download(&dest, succeeded, &core.mailbox);
        });
    }

    /// Clear storage, reporting `true` to `callback` from a later tick
    ///
    /// Every `get` issued while the clearing flag is raised fails at once.
    /// With [`ClearingPolicy::AfterPost`] the flag drops as soon as the
    /// completion is queued, before `callback` has run.
    pub fn clear_storage<F>(&self, callback: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let core = Arc::clone(self.core());
        core.clearing.store(true, Ordering::Release);
        core.poll.note_operation_started();
        info!("Clearing storage");

        let policy = self.config.clearing_policy;
        self.runtime.spawn(async move {
            match policy {
                ClearingPolicy::AfterPost => {
                    core.mailbox.post(Box::new(callback), true);
                    core.clearing.store(false, Ordering::Release);
                }
                ClearingPolicy::UntilDelivered => {
                    let flag_owner = Arc::clone(&core);
                    core.mailbox.post(
                        Box::new(move |ok| {
                            flag_owner.clearing.store(false, Ordering::Release);
                            callback(ok);
                        }),
                        true,
                    );
                }
            }
        });
    }

    /// Periodic entry point for the host scheduler
    ///
    /// Must be called from the main context. Runs every queued callback and
    /// returns how many ran.
    pub fn tick(&self, delta_time: Duration) -> usize {
        trace!("tick after {:?}", delta_time);
        self.core.get().map_or(0, |core| core.mailbox.drain())
    }

    /// Operations whose callback has not been delivered yet
    pub fn pending_operations(&self) -> usize {
        self.core.get().map_or(0, |core| core.poll.pending())
    }

    /// Whether a transfer to `dest_file` is in flight
    pub fn is_downloading(&self, dest_file: impl AsRef<Path>) -> bool {
        self.core
            .get()
            .is_some_and(|core| core.registry.is_in_flight(dest_file.as_ref()))
    }

    /// Number of destinations currently downloading
    pub fn in_flight(&self) -> usize {
        self.core
            .get()
            .map_or(0, |core| core.registry.in_flight_count())
    }

    /// Whether new requests are currently rejected
    pub fn is_clearing(&self) -> bool {
        self.core
            .get()
            .is_some_and(|core| core.clearing.load(Ordering::Acquire))
    }

    /// Whether the host has been asked to tick
    pub fn is_polling(&self) -> bool {
        self.core.get().is_some_and(|core| core.poll.is_scheduled())
    }
}

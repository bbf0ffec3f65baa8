//! Core application logic for webfile
//!
//! This module contains the download coordinator and the pieces it is built
//! from: the HTTP transfer side, the in-flight registry and the main-context
//! callback delivery.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use webfile::app::{ManualScheduler, PollConfig, ReqwestFetcher, WebFile};
//!
//! # async fn example() {
//! let scheduler = Arc::new(ManualScheduler::new());
//! let webfile = WebFile::new(
//!     tokio::runtime::Handle::current(),
//!     scheduler,
//!     Arc::new(ReqwestFetcher::default()),
//!     PollConfig::default(),
//! );
//!
//! webfile.get("https://example.com/a.bin", "/tmp/a.bin", |ok| {
//!     println!("done: {}", ok);
//! });
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod delivery;
pub mod registry;

// Re-export main public API
pub use client::{ClientConfig, HttpFetcher, ReqwestFetcher, TransferExecutor};
pub use coordinator::WebFile;
pub use delivery::{
    Callback, ClearingPolicy, Mailbox, ManualScheduler, PollConfig, PollController, TickScheduler,
};
pub use registry::{DedupRegistry, RequestOutcome, Reservation};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Ensure public API is accessible
        let config = ClientConfig::default();
        assert!(config.tcp_nodelay);
        assert!(!PollConfig::default().stop_when_idle);
    }
}

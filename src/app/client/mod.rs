//! HTTP side of webfile
//!
//! - [`config`] - reqwest client settings
//! - [`fetcher`] - the `HttpFetcher` capability and its reqwest backend
//! - [`transfer`] - the transfer executor that writes a response to disk

pub mod config;
pub mod fetcher;
pub mod transfer;

pub use config::ClientConfig;
pub use fetcher::{BodySink, HttpFetcher, ReqwestFetcher};
pub use transfer::TransferExecutor;

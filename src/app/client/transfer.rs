//! Transfer executor: one GET streamed straight into the destination file
//!
//! The destination is created (or truncated) before the request is made and
//! is left on disk as-is when the transfer fails. Every failure is logged
//! here and reported to the caller as `false`.

use std::path::Path;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use super::fetcher::HttpFetcher;
use crate::errors::{DownloadError, DownloadResult};

/// Runs transfers through an [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct TransferExecutor {
    fetcher: Arc<dyn HttpFetcher>,
}

impl TransferExecutor {
    /// Create an executor around the given fetcher
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self { fetcher }
    }

    /// Download `url` into `destination`, returning whether it succeeded
    pub async fn run(&self, url: &str, destination: &Path) -> bool {
        info!("Downloading {} -> {}", url, destination.display());

        match self.try_run(url, destination).await {
            Ok(bytes) => {
                info!(
                    "Successfully downloaded {} bytes to {}",
                    bytes,
                    destination.display()
                );
                true
            }
            Err(e) => {
                error!(
                    kind = e.kind(),
                    "Download of {} to {} failed: {}",
                    url,
                    destination.display(),
                    e
                );
                false
            }
        }
    }

    async fn try_run(&self, url: &str, destination: &Path) -> DownloadResult<u64> {
        let mut file = File::create(destination)
            .await
            .map_err(|source| DownloadError::FileOpen {
                path: destination.to_path_buf(),
                source,
            })?;

        let fetched = self.fetcher.fetch_into(url, &mut file).await;
        // The handle is closed when `file` drops, whatever the outcome.
        let flushed = file.flush().await;

        let bytes = fetched?;
        flushed?;
        Ok(bytes)
    }
}

//! HTTP transfer capability
//!
//! The coordinator only needs "GET this URL and write the body somewhere".
//! [`HttpFetcher`] is that seam; [`ReqwestFetcher`] is the production backend.

use std::fmt::Debug;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use reqwest::Client;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;
use url::Url;

use crate::app::client::config::ClientConfig;
use crate::errors::{DownloadError, DownloadResult};

/// Sink the response body is streamed into
pub type BodySink<'a> = &'a mut (dyn AsyncWrite + Unpin + Send);

/// Performs a single HTTP GET and writes the body incrementally
#[async_trait]
pub trait HttpFetcher: Send + Sync + Debug {
    /// Fetch `url`, following redirects, and write the response body into
    /// `sink`. Returns the number of body bytes written.
    ///
    /// # Errors
    ///
    /// `ClientInit` when no client could be obtained, `Http`/`ServerError`/
    /// `InvalidUrl` for transfer failures and `Io` when the sink rejects data.
    async fn fetch_into(&self, url: &str, sink: BodySink<'_>) -> DownloadResult<u64>;
}

/// reqwest-backed fetcher
///
/// The underlying client is built on first use and reused afterwards. A build
/// failure is reported for that transfer only; the next transfer tries again.
#[derive(Debug)]
pub struct ReqwestFetcher {
    config: ClientConfig,
    client: Mutex<Option<Client>>,
}

impl ReqwestFetcher {
    /// Create a fetcher that builds its client from `config` on demand
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    /// Create a fetcher around an already built client
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self {
            config,
            client: Mutex::new(Some(client)),
        }
    }

    /// Client configuration used for lazy initialization
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn client(&self) -> DownloadResult<Client> {
        let mut slot = self.client.lock();
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = self.config.build_http_client()?;
        debug!("Initialized HTTP client");
        *slot = Some(client.clone());
        Ok(client)
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch_into(&self, url: &str, sink: BodySink<'_>) -> DownloadResult<u64> {
        let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        let client = self.client()?;
        let response = client.get(parsed).send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
            });
        }

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        debug!("Fetched {} bytes from {}", written, url);
        Ok(written)
    }
}

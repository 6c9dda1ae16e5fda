// ! HTTP download provider
// !
// ! Fetches a resource with reqwest, streams it into `<destination>.tmp` and
// ! then swaps it over the destination. With `only_if_newer` a `HEAD` probe
// ! compares the remote `Last-Modified` with the local modification time and
// ! skips the transfer when the local copy is at least as new.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use reqwest::header::LAST_MODIFIED;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::download::{DownloadProvider, DownloadStatus, discard, replace_file, temp_path};
use crate::plugin::config::HttpConfig;

/// Default provider backed by an HTTP client
#[derive(Debug, Clone)]
pub struct HttpDownloadProvider {
    client: Client,
    only_if_newer: bool,
}

impl HttpDownloadProvider {
    /// Create a provider with default timeouts that always downloads
    pub fn new() -> UpdaterResult<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a provider from HTTP settings
    pub fn with_config(config: &HttpConfig) -> UpdaterResult<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms));

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder
            .build()
            .map_err(|e| UpdaterError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            only_if_newer: config.only_if_newer,
        })
    }

    /// Skip transfers when the local copy is at least as new as the remote one
    pub fn with_only_if_newer(mut self, enabled: bool) -> Self {
        self.only_if_newer = enabled;
        self
    }

    /// Whether the `Last-Modified` probe is enabled
    pub fn only_if_newer(&self) -> bool {
        self.only_if_newer
    }

    async fn remote_last_modified(&self, source: &str) -> UpdaterResult<Option<DateTime<Utc>>> {
        let response = self.client.head(source).send().await?.error_for_status()?;

        let Some(header) = response.headers().get(LAST_MODIFIED) else {
            return Ok(None);
        };
        let parsed = header
            .to_str()
            .ok()
            .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
            .map(|time| time.with_timezone(&Utc));

        if parsed.is_none() {
            debug!("Ignoring unparseable Last-Modified from {}", source);
        }
        Ok(parsed)
    }

    async fn local_modified(destination: &Path) -> UpdaterResult<Option<DateTime<Utc>>> {
        match tokio::fs::metadata(destination).await {
            Ok(metadata) => Ok(Some(DateTime::<Utc>::from(metadata.modified()?))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_local_current(&self, source: &str, destination: &Path) -> UpdaterResult<bool> {
        let Some(local) = Self::local_modified(destination).await? else {
            return Ok(false);
        };
        let Some(remote) = self.remote_last_modified(source).await? else {
            return Ok(false);
        };
        debug!(
            "Comparing {:?} (local {}) with {} (remote {})",
            destination, local, source, remote
        );
        Ok(local >= remote)
    }
}

async fn stream_to_file(response: &mut Response, staged: &Path) -> UpdaterResult<u64> {
    let mut file = tokio::fs::File::create(staged).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

#[async_trait]
impl DownloadProvider for HttpDownloadProvider {
    async fn fetch(&self, source: &str, destination: &Path) -> UpdaterResult<DownloadStatus> {
        if self.only_if_newer && self.is_local_current(source, destination).await? {
            info!("{:?} is up to date with {}", destination, source);
            return Ok(DownloadStatus::UpToDate);
        }

        let mut response = self.client.get(source).send().await?.error_for_status()?;

        let staged = temp_path(destination);
        let staged_result = match stream_to_file(&mut response, &staged).await {
            Ok(written) => replace_file(&staged, destination).await.map(|()| written),
            Err(e) => Err(e),
        };
        let written = match staged_result {
            Ok(written) => written,
            Err(e) => {
                discard(&staged).await;
                return Err(e);
            }
        };
        info!("Downloaded {} ({} bytes) to {:?}", source, written, destination);

        Ok(DownloadStatus::Success)
    }
}

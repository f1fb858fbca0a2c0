use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{FetcherError, FetcherResult};

/// Plain GET access to the mirror.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a small text resource such as a checksum file.
    async fn fetch_text(&self, url: &str) -> FetcherResult<String>;

    /// Stream `url` into `dest`, replacing any existing file. Returns the
    /// number of bytes written.
    async fn download_to(&self, url: &str, dest: &Path) -> FetcherResult<u64>;
}

/// `Transport` over a shared reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> FetcherResult<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetcherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &str) -> FetcherResult<String> {
        let text = self.get(url).await?.text().await?;
        Ok(text)
    }

    async fn download_to(&self, url: &str, dest: &Path) -> FetcherResult<u64> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(FetcherError::io(parent))?;
        }

        let response = self.get(url).await?;
        let total_bytes = response.content_length();
        let mut stream = response.bytes_stream();

        let mut written = 0u64;
        // Scoped so the handle is closed before the file is hashed.
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(FetcherError::io(dest))?;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await.map_err(FetcherError::io(dest))?;
                written += chunk.len() as u64;
            }
            file.flush().await.map_err(FetcherError::io(dest))?;
        }

        debug!(
            "Downloaded: {} -> {:?} ({} of {:?} bytes)",
            url, dest, written, total_bytes
        );
        Ok(written)
    }
}

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::core::{is_success, retry_delay};
use crate::data::{CHUNK_SIZE, FetchOptions, FetchPhase, Progress};
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

/// Streams a URL to disk, retrying failed attempts with exponential backoff.
///
/// The body is written to a `.part` sibling of the destination and renamed
/// into place only after the whole body arrived, so `destination` never
/// holds a partial download.
pub struct Fetcher<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Download `url` to `destination`, returning the number of bytes
    /// written.
    pub async fn fetch(&self, url: &str, destination: &Path, options: &FetchOptions) -> Result<u64> {
        let staging = staging_path(destination);
        let attempts = options.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.attempt(url, &staging, options, attempt).await {
                Ok(bytes) => {
                    report(options, FetchPhase::Committing, bytes, options.expected_size, attempt);
                    tokio::fs::rename(&staging, destination)
                        .await
                        .map_err(|e| FetchError::io(destination, e))?;
                    report(options, FetchPhase::Completed, bytes, options.expected_size, attempt);
                    tracing::info!(url, bytes, attempt, "download complete");
                    return Ok(bytes);
                }
                Err(e) => {
                    tracing::warn!(url, attempt, error = %e, "download attempt failed");
                    let _ = tokio::fs::remove_file(&staging).await;
                    if attempt + 1 >= attempts {
                        return Err(FetchError::MaxRetriesExceeded {
                            count: attempts,
                            last: Box::new(e),
                        });
                    }
                    tokio::time::sleep(retry_delay(attempt, options.retry_backoff)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        staging: &Path,
        options: &FetchOptions,
        attempt: u32,
    ) -> Result<u64> {
        report(options, FetchPhase::Connecting, 0, options.expected_size, attempt);

        let response = tokio::time::timeout(options.timeout, self.client.stream(url, &options.headers))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                after: options.timeout,
            })?
            .map_err(|e| FetchError::transport(url, e))?;

        if !is_success(response.status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        let total = options.expected_size.or(response.content_length);
        let mut body = response.body;
        let mut file = tokio::fs::File::create(staging)
            .await
            .map_err(|e| FetchError::io(staging, e))?;
        let mut downloaded = 0u64;

        report(options, FetchPhase::Downloading, 0, total, attempt);

        loop {
            let next = tokio::time::timeout(options.timeout, body.next())
                .await
                .map_err(|_| FetchError::Timeout {
                    url: url.to_string(),
                    after: options.timeout,
                })?;
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(|e| FetchError::transport(url, e))?;

            for piece in chunk.chunks(CHUNK_SIZE) {
                file.write_all(piece)
                    .await
                    .map_err(|e| FetchError::io(staging, e))?;
                downloaded += piece.len() as u64;
                report(options, FetchPhase::Downloading, downloaded, total, attempt);
            }
        }

        file.flush().await.map_err(|e| FetchError::io(staging, e))?;
        file.sync_all().await.map_err(|e| FetchError::io(staging, e))?;
        Ok(downloaded)
    }
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    destination.with_file_name(name)
}

fn report(options: &FetchOptions, phase: FetchPhase, bytes: u64, total: Option<u64>, attempt: u32) {
    if let Some(ref callback) = options.on_progress {
        callback(&Progress {
            phase,
            bytes_downloaded: bytes,
            total_bytes: total,
            attempt,
        });
    }
}

use std::time::Duration;

use uplift_archive::is_archive_name;
use uplift_fetch::{HttpClient, is_redirect};

use crate::endpoints::Repository;
use crate::error::{Result, SourceError};
use crate::model::{DownloadTarget, ReleaseInfo};

/// Picks what to download for a release.
///
/// An uploaded `.zip` asset always wins without a probe. Otherwise each
/// constructed archive URL is probed with HEAD in order and the first one
/// answering 200 or a redirect is taken with unknown size.
pub struct AssetResolver<C: HttpClient> {
    client: C,
    repository: Repository,
    probe_timeout: Duration,
    user_agent: String,
}

impl<C: HttpClient> AssetResolver<C> {
    pub fn new(
        client: C,
        repository: Repository,
        probe_timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client,
            repository,
            probe_timeout,
            user_agent: user_agent.into(),
        }
    }

    pub async fn resolve(&self, release: &ReleaseInfo) -> Result<DownloadTarget> {
        if let Some(asset) = release.assets.iter().find(|a| is_archive_name(&a.name)) {
            tracing::debug!(asset = %asset.name, "using uploaded asset");
            return Ok(DownloadTarget {
                url: asset.download_url.clone(),
                file_name: asset.name.clone(),
                expected_size: asset.size_bytes,
            });
        }

        let headers = [("User-Agent".to_string(), self.user_agent.clone())];
        for url in &release.archive_urls {
            match tokio::time::timeout(self.probe_timeout, self.client.head(url, &headers)).await {
                Ok(Ok(status)) if status == 200 || is_redirect(status) => {
                    tracing::debug!(url, status, "archive URL reachable");
                    return Ok(DownloadTarget {
                        url: url.clone(),
                        file_name: self.repository.fallback_file_name(&release.tag),
                        expected_size: 0,
                    });
                }
                Ok(Ok(status)) => tracing::warn!(url, status, "archive URL rejected"),
                Ok(Err(e)) => tracing::warn!(url, error = %e, "archive URL probe failed"),
                Err(_) => tracing::warn!(url, timeout = ?self.probe_timeout, "archive URL probe timed out"),
            }
        }

        Err(SourceError::NoUsableAsset {
            version: release.version.clone(),
            tried: release.archive_urls.clone(),
        })
    }
}

use std::time::Duration;

use uplift_fetch::{HttpClient, linear_delay};
use uplift_version::normalize_tag;

use crate::endpoints::{RegistryEndpoints, Repository, tag_from_release_url};
use crate::error::{EndpointError, Result, SourceError};
use crate::model::{ApiRelease, ReleaseInfo};

pub const API_ACCEPT: &str = "application/vnd.github.v3+json";

/// Tunables for [`ReleaseSource::fetch_latest`].
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Full passes over both endpoints.
    pub passes: u32,
    /// Wait after failed pass `n` (0-indexed) is `backoff_step * (n + 1)`.
    pub backoff_step: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            passes: 3,
            backoff_step: Duration::from_secs(2),
            timeout: Duration::from_secs(30),
            user_agent: concat!("uplift/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches the latest release from the registry, falling back from the
/// structured API to the human-facing page.
pub struct ReleaseSource<C: HttpClient> {
    client: C,
    repository: Repository,
    endpoints: RegistryEndpoints,
    options: CheckOptions,
}

impl<C: HttpClient> ReleaseSource<C> {
    pub fn new(
        client: C,
        repository: Repository,
        endpoints: RegistryEndpoints,
        options: CheckOptions,
    ) -> Self {
        Self {
            client,
            repository,
            endpoints,
            options,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn endpoints(&self) -> &RegistryEndpoints {
        &self.endpoints
    }

    /// Latest release, or [`SourceError::Network`] once every pass over
    /// every endpoint failed.
    pub async fn fetch_latest(&self) -> Result<ReleaseInfo> {
        let passes = self.options.passes.max(1);
        let mut last = String::new();

        for pass in 0..passes {
            match self.from_api().await {
                Ok(release) => return Ok(release),
                Err(e) => {
                    tracing::warn!(pass, endpoint = "api", error = %e, "release endpoint failed");
                    last = format!("api: {e}");
                }
            }

            match self.from_web().await {
                Ok(release) => return Ok(release),
                Err(e) => {
                    tracing::warn!(pass, endpoint = "web", error = %e, "release endpoint failed");
                    last = format!("web: {e}");
                }
            }

            if pass + 1 < passes {
                let delay = linear_delay(pass, self.options.backoff_step);
                tracing::debug!(pass, ?delay, "backing off before next check pass");
                tokio::time::sleep(delay).await;
            }
        }

        Err(SourceError::Network { passes, last })
    }

    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> std::result::Result<uplift_fetch::Response, EndpointError> {
        let response = tokio::time::timeout(self.options.timeout, self.client.get(url, headers))
            .await
            .map_err(|_| EndpointError::Timeout)?
            .map_err(|e| EndpointError::Transport(e.to_string()))?;
        if response.status != 200 {
            return Err(EndpointError::Status(response.status));
        }
        Ok(response)
    }

    async fn from_api(&self) -> std::result::Result<ReleaseInfo, EndpointError> {
        let url = self.repository.api_latest_url(&self.endpoints);
        let headers = [
            ("User-Agent".to_string(), self.options.user_agent.clone()),
            ("Accept".to_string(), API_ACCEPT.to_string()),
        ];
        let response = self.get(&url, &headers).await?;
        let api: ApiRelease = serde_json::from_slice(&response.body)?;

        let source_url = api
            .html_url
            .unwrap_or_else(|| self.repository.release_page_url(&self.endpoints, &api.tag_name));
        Ok(ReleaseInfo {
            version: normalize_tag(&api.tag_name).to_string(),
            archive_urls: self.repository.archive_urls(&self.endpoints, &api.tag_name),
            notes: api.body.unwrap_or_default(),
            assets: api.assets.into_iter().map(Into::into).collect(),
            tag: api.tag_name,
            source_url,
        })
    }

    /// The web page carries no structured data; the tag is read from the
    /// URL it redirects to.
    async fn from_web(&self) -> std::result::Result<ReleaseInfo, EndpointError> {
        let url = self.repository.web_latest_url(&self.endpoints);
        let headers = [("User-Agent".to_string(), self.options.user_agent.clone())];
        let response = self.get(&url, &headers).await?;

        let tag = tag_from_release_url(&response.final_url)
            .ok_or_else(|| EndpointError::NoTag(response.final_url.clone()))?;
        Ok(ReleaseInfo {
            version: normalize_tag(tag).to_string(),
            tag: tag.to_string(),
            notes: String::new(),
            assets: Vec::new(),
            archive_urls: self.repository.archive_urls(&self.endpoints, tag),
            source_url: response.final_url.clone(),
        })
    }
}

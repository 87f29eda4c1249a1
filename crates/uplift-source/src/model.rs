use serde::{Deserialize, Serialize};

/// A published release as seen by the updater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Tag with any leading `v` stripped.
    pub version: String,
    /// Tag exactly as published; archive URLs and file names are built from it.
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub assets: Vec<AssetRef>,
    /// Constructed source-archive URLs, highest priority first.
    #[serde(default)]
    pub archive_urls: Vec<String>,
    /// Human-facing release page.
    #[serde(default)]
    pub source_url: String,
}

/// An artifact uploaded to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub name: String,
    pub download_url: String,
    #[serde(default)]
    pub size_bytes: u64,
}

/// What the downloader should fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTarget {
    pub url: String,
    pub file_name: String,
    /// 0 when unknown.
    pub expected_size: u64,
}

impl DownloadTarget {
    pub fn known_size(&self) -> Option<u64> {
        (self.expected_size > 0).then_some(self.expected_size)
    }
}

/// Wire shape of the structured release endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiRelease {
    pub tag_name: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub assets: Vec<ApiAsset>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

impl From<ApiAsset> for AssetRef {
    fn from(asset: ApiAsset) -> Self {
        AssetRef {
            name: asset.name,
            download_url: asset.browser_download_url,
            size_bytes: asset.size,
        }
    }
}

//! Registry hosts and the URL templates built from them.

use serde::{Deserialize, Serialize};

/// Base URLs of the release registry. Overridable so tests can point at a
/// local server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEndpoints {
    /// Structured metadata API.
    pub api: String,
    /// Human-facing site; also serves source archives.
    pub web: String,
    /// Alternate host for source archives.
    pub mirror: String,
}

impl Default for RegistryEndpoints {
    fn default() -> Self {
        Self {
            api: "https://api.github.com".to_string(),
            web: "https://github.com".to_string(),
            mirror: "https://codeload.github.com".to_string(),
        }
    }
}

impl RegistryEndpoints {
    /// Use one base for every host.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            api: base.clone(),
            web: base.clone(),
            mirror: base,
        }
    }
}

/// Owner/name pair identifying a repository on the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn api_latest_url(&self, endpoints: &RegistryEndpoints) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            trim(&endpoints.api),
            self.owner,
            self.name
        )
    }

    pub fn web_latest_url(&self, endpoints: &RegistryEndpoints) -> String {
        format!(
            "{}/{}/{}/releases/latest",
            trim(&endpoints.web),
            self.owner,
            self.name
        )
    }

    pub fn release_page_url(&self, endpoints: &RegistryEndpoints, tag: &str) -> String {
        format!(
            "{}/{}/{}/releases/tag/{}",
            trim(&endpoints.web),
            self.owner,
            self.name,
            tag
        )
    }

    /// Source-archive URLs for `tag`: the web host first, then the mirror.
    pub fn archive_urls(&self, endpoints: &RegistryEndpoints, tag: &str) -> Vec<String> {
        vec![
            format!(
                "{}/{}/{}/archive/refs/tags/{}.zip",
                trim(&endpoints.web),
                self.owner,
                self.name,
                tag
            ),
            format!(
                "{}/{}/{}/zip/refs/tags/{}",
                trim(&endpoints.mirror),
                self.owner,
                self.name,
                tag
            ),
        ]
    }

    /// File name for a source-archive download.
    pub fn fallback_file_name(&self, tag: &str) -> String {
        format!("{}-{}.zip", self.name, tag)
    }
}

fn trim(base: &str) -> &str {
    base.trim_end_matches('/')
}

/// Pull the tag out of a `.../releases/tag/<tag>` URL.
pub fn tag_from_release_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let (_, tag) = path.rsplit_once("/releases/tag/")?;
    let tag = tag.trim_end_matches('/');
    (!tag.is_empty() && !tag.contains('/')).then_some(tag)
}

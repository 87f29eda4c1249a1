//! Installation configuration and engine tunables.

use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uplift_source::{CheckOptions, RegistryEndpoints, Repository};

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_OWNER: &str = "yuanxiao9889";
pub const DEFAULT_REPO: &str = "MJ-translate";

/// The installed version and where its releases are published.
///
/// Read from the application's `config.json`, which also holds unrelated
/// application settings; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "version")]
    pub current_version: String,
    #[serde(rename = "github_owner")]
    pub registry_owner: String,
    #[serde(rename = "github_repo")]
    pub registry_repo: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            current_version: DEFAULT_VERSION.to_string(),
            registry_owner: DEFAULT_OWNER.to_string(),
            registry_repo: DEFAULT_REPO.to_string(),
        }
    }
}

impl Config {
    /// Parse a configuration document. Missing keys take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load `path`, falling back to defaults when the file is missing,
    /// unreadable or malformed.
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                return Self::default();
            }
        };

        Self::from_json(&json).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "config malformed, using defaults");
            Self::default()
        })
    }

    pub fn repository(&self) -> Repository {
        Repository::new(&self.registry_owner, &self.registry_repo)
    }
}

/// Network tunables. The defaults are the values the updater ships with;
/// tests shrink them and point `endpoints` at a local server.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub endpoints: RegistryEndpoints,
    pub user_agent: String,
    /// Full passes over both release endpoints.
    pub check_passes: u32,
    /// Linear step between check passes.
    pub check_backoff: Duration,
    pub check_timeout: Duration,
    pub probe_timeout: Duration,
    pub download_attempts: u32,
    /// Exponential base between download attempts.
    pub download_backoff: Duration,
    pub download_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            endpoints: RegistryEndpoints::default(),
            user_agent: concat!("uplift/", env!("CARGO_PKG_VERSION")).to_string(),
            check_passes: 3,
            check_backoff: Duration::from_secs(2),
            check_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
            download_attempts: 3,
            download_backoff: Duration::from_secs(1),
            download_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineOptions {
    pub(crate) fn check_options(&self) -> CheckOptions {
        CheckOptions {
            passes: self.check_passes,
            backoff_step: self.check_backoff,
            timeout: self.check_timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

//! Release versions parsed from registry tags.

use semver::Version;
use std::cmp::Ordering;
use std::ops::Deref;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("invalid semver '{input}': {source}")]
    SemVer {
        input: String,
        source: semver::Error,
    },
}

/// A tag that parsed as a semantic version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemVer(Version);

impl SemVer {
    /// Create new SemVer.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Parse after stripping a leading `v`/`V`.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let trimmed = crate::normalize_tag(s);
        Version::parse(trimmed)
            .map(Self)
            .map_err(|source| VersionError::SemVer {
                input: s.to_string(),
                source,
            })
    }

    pub fn inner(&self) -> &Version {
        &self.0
    }

    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// SemVer precedence; build metadata does not count.
    pub fn precedence(&self, other: &SemVer) -> Ordering {
        self.0.cmp_precedence(&other.0)
    }
}

impl std::str::FromStr for SemVer {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for SemVer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for SemVer {
    type Target = Version;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uplift_archive::is_archive_name;
use uplift_source::ReleaseInfo;

use crate::error::{Error, Result};

/// Everything a user needs to update by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualUpdateInfo {
    pub version: String,
    /// Human-facing release page.
    pub release_url: String,
    /// Source-archive URLs, in the order they would have been tried.
    pub download_urls: Vec<String>,
    /// Where to put the downloaded archive.
    pub manual_dir: PathBuf,
    pub steps: Vec<String>,
}

pub fn build_manual_instructions(release: &ReleaseInfo, manual_dir: &Path) -> ManualUpdateInfo {
    let steps = vec![
        format!("1. Open the release page: {}", release.source_url),
        "2. Download the source code ZIP archive".to_string(),
        format!("3. Place the downloaded file in: {}", manual_dir.display()),
        "4. Run the updater again".to_string(),
    ];

    ManualUpdateInfo {
        version: release.version.clone(),
        release_url: release.source_url.clone(),
        download_urls: release.archive_urls.clone(),
        manual_dir: manual_dir.to_path_buf(),
        steps,
    }
}

/// First `.zip` file in `dir` by name, or `None` when there is none or the
/// directory does not exist.
pub fn find_manual_archive(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(Error::ScanDir {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::ScanDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && entry.file_name().to_str().is_some_and(is_archive_name) {
            archives.push(entry.path());
        }
    }
    archives.sort();
    Ok(archives.into_iter().next())
}

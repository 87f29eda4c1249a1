//! ZIP extraction.
//!
//! Entries are written in archive order. A CRC failure surfaces while the
//! entry is copied, so a truncated or tampered archive fails part-way; the
//! caller is expected to extract into a scratch directory it can discard.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sanitize::sanitize_entry_path;

/// What an extraction wrote.
#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub entry_count: usize,
    pub total_bytes: u64,
    /// Paths relative to the extraction directory, in archive order.
    pub entries: Vec<PathBuf>,
}

/// Extract the ZIP archive at `archive` into `destination`.
pub fn extract_zip(archive: &Path, destination: &Path) -> Result<ExtractReport> {
    let file = File::open(archive).map_err(|e| Error::Open {
        path: archive.to_path_buf(),
        source: e,
    })?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file)).map_err(Error::Corrupted)?;
    if zip.len() == 0 {
        return Err(Error::Empty);
    }

    fs::create_dir_all(destination).map_err(|e| Error::DirectoryCreationFailed {
        path: destination.to_path_buf(),
        source: e,
    })?;

    let mut report = ExtractReport::default();

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(Error::Corrupted)?;
        let name = entry.name().to_string();
        let target = sanitize_entry_path(&name, destination)?;

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::DirectoryCreationFailed {
                path: target.clone(),
                source: e,
            })?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            let mut out = File::create(&target).map_err(|e| Error::ExtractionFailed {
                path: target.clone(),
                source: e,
            })?;
            let written = io::copy(&mut entry, &mut out).map_err(|e| Error::ExtractionFailed {
                path: target.clone(),
                source: e,
            })?;
            report.total_bytes += written;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777)).map_err(
                    |e| Error::ExtractionFailed {
                        path: target.clone(),
                        source: e,
                    },
                )?;
            }
        }

        if let Ok(relative) = target.strip_prefix(destination) {
            report.entries.push(relative.to_path_buf());
        }
        report.entry_count += 1;
    }

    Ok(report)
}

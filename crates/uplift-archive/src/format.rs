/// Extension of the only archive format update payloads ship in.
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Case-insensitive check for the archive extension.
pub fn is_archive_name(name: &str) -> bool {
    name.len() > ARCHIVE_EXTENSION.len()
        && name
            .get(name.len() - ARCHIVE_EXTENSION.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry name against `base`, rejecting anything that
/// would land outside it.
pub fn sanitize_entry_path(entry: &str, base: &Path) -> Result<PathBuf> {
    if entry.contains('\0') {
        return Err(Error::InvalidPath);
    }

    let mut relative = PathBuf::new();
    for component in Path::new(entry).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(Error::ZipSlip {
                        entry: entry.to_string(),
                    });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::ZipSlip {
                    entry: entry.to_string(),
                });
            }
        }
    }

    Ok(base.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_entries() {
        let base = Path::new("/tmp/x");
        assert_eq!(
            sanitize_entry_path("app/main.py", base).unwrap(),
            base.join("app/main.py")
        );
        assert_eq!(
            sanitize_entry_path("./app/./a/../b.py", base).unwrap(),
            base.join("app/b.py")
        );
    }

    #[test]
    fn test_rejects_escape() {
        let base = Path::new("/tmp/x");
        assert!(matches!(
            sanitize_entry_path("../evil", base),
            Err(Error::ZipSlip { .. })
        ));
        assert!(matches!(
            sanitize_entry_path("a/../../evil", base),
            Err(Error::ZipSlip { .. })
        ));
        assert!(matches!(
            sanitize_entry_path("/etc/passwd", base),
            Err(Error::ZipSlip { .. })
        ));
    }

    #[test]
    fn test_rejects_null_byte() {
        assert!(matches!(
            sanitize_entry_path("a\0b", Path::new("/tmp")),
            Err(Error::InvalidPath)
        ));
    }
}

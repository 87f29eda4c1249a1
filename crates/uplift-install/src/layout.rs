use std::path::{Path, PathBuf};

pub const BACKUP_DIR: &str = "backup_before_update";
pub const CACHE_DIR: &str = ".update_cache";
pub const CACHE_FILE: &str = "latest_release.json";
pub const LOCK_FILE: &str = "update.lock";
pub const MANUAL_DIR: &str = "manual_update";
pub const CONFIG_FILE: &str = "config.json";

/// Installation paths that are snapshotted before an update: the entry
/// point, the source trees, the configuration and the dependency manifest.
pub const DEFAULT_BACKUP_ITEMS: &[&str] =
    &["main.py", "services", "views", "config.json", "requirements.txt"];

/// Every fixed path the updater uses, derived from the installation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
    backup_items: Vec<PathBuf>,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            backup_items: DEFAULT_BACKUP_ITEMS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Replace the backup allow-list. Items are relative to the root.
    #[must_use]
    pub fn with_backup_items<I, P>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.backup_items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_items(&self) -> &[PathBuf] {
        &self.backup_items
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(CACHE_DIR)
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir().join(CACHE_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.cache_dir().join(LOCK_FILE)
    }

    pub fn manual_dir(&self) -> PathBuf {
        self.root.join(MANUAL_DIR)
    }

    /// Top-level names the updater owns. An update payload never overwrites
    /// these.
    pub fn reserved_names(&self) -> [&'static str; 3] {
        [BACKUP_DIR, CACHE_DIR, MANUAL_DIR]
    }
}

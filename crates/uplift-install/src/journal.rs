use std::path::{Path, PathBuf};

/// A top-level installation path an apply was about to touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Relative to the installation root.
    pub path: PathBuf,
    pub existed: bool,
}

/// Ordered record of what an apply touched, written before each mutation
/// so it is complete even when the apply fails half-way.
#[derive(Debug, Clone, Default)]
pub struct ApplyJournal {
    entries: Vec<JournalEntry>,
}

impl ApplyJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: impl Into<PathBuf>, existed: bool) {
        self.entries.push(JournalEntry {
            path: path.into(),
            existed,
        });
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths the apply created.
    pub fn created(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|e| !e.existed)
            .map(|e| e.path.as_path())
    }

    /// Paths the apply overwrote.
    pub fn overwritten(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|e| e.existed)
            .map(|e| e.path.as_path())
    }
}

use super::options::FetchPhase;

/// Snapshot of a download handed to progress callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Bytes written to the staging file during the current attempt.
    pub bytes_downloaded: u64,

    /// Expected size if the release or the server advertised one.
    pub total_bytes: Option<u64>,

    /// 0 for the first attempt.
    pub attempt: u32,
}

impl Progress {
    /// Fraction complete in `[0.0, 1.0]`, or `None` when the size is unknown.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) | None => None,
            Some(total) => Some((self.bytes_downloaded as f64 / total as f64).min(1.0)),
        }
    }
}

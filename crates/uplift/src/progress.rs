//! Progress reporting to the embedding application.

use std::fmt;

/// Pipeline stage a [`ProgressEvent`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Checking,
    BackingUp,
    Downloading,
    Extracting,
    Applying,
    Cleanup,
    Done,
    Failed,
}

impl Stage {
    /// Percent reported on entering the stage.
    pub fn anchor(self) -> u8 {
        match self {
            Stage::Checking => 5,
            Stage::BackingUp => 20,
            Stage::Downloading => DOWNLOAD_START,
            Stage::Extracting => 75,
            Stage::Applying => 85,
            Stage::Cleanup => 95,
            Stage::Done | Stage::Failed => 100,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Checking => "checking",
            Stage::BackingUp => "backing-up",
            Stage::Downloading => "downloading",
            Stage::Extracting => "extracting",
            Stage::Applying => "applying",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

const DOWNLOAD_START: u8 = 30;
const DOWNLOAD_END: u8 = 70;

/// Byte counts attached to download events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub bytes: u64,
    /// `None` when neither the release nor the server gave a size.
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percent: u8,
    pub stage: Stage,
    pub message: String,
    pub transfer: Option<Transfer>,
}

impl ProgressEvent {
    /// An event at the stage's anchor percent.
    pub fn stage(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            percent: stage.anchor(),
            stage,
            message: message.into(),
            transfer: None,
        }
    }

    /// A download event. With a known total the percent moves through the
    /// download range; without one it stays at the range start.
    pub fn downloading(bytes: u64, total: Option<u64>) -> Self {
        let percent = match total {
            Some(total) if total > 0 => {
                let span = u64::from(DOWNLOAD_END - DOWNLOAD_START);
                let done = (bytes.min(total) * span) / total;
                DOWNLOAD_START + done as u8
            }
            _ => DOWNLOAD_START,
        };
        let message = match total {
            Some(total) => format!("Downloaded {bytes} of {total} bytes"),
            None => format!("Downloaded {bytes} bytes"),
        };
        Self {
            percent,
            stage: Stage::Downloading,
            message,
            transfer: Some(Transfer { bytes, total }),
        }
    }
}

/// Receives progress from the engine, always on the engine's worker task.
/// Implementations hand events over to their own presentation context.
pub trait ProgressSink: Send + Sync {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {}

/// Textual fallback used when the caller supplies no sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn report(&self, event: &ProgressEvent) {
        match event.stage {
            Stage::Downloading => tracing::debug!(
                percent = event.percent,
                stage = %event.stage,
                "{}",
                event.message
            ),
            Stage::Failed => tracing::error!(
                percent = event.percent,
                stage = %event.stage,
                "{}",
                event.message
            ),
            _ => tracing::info!(percent = event.percent, stage = %event.stage, "{}", event.message),
        }
    }
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_anchors_increase() {
        let order = [
            Stage::Checking,
            Stage::BackingUp,
            Stage::Downloading,
            Stage::Extracting,
            Stage::Applying,
            Stage::Cleanup,
            Stage::Done,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].anchor() < pair[1].anchor(), "{pair:?}");
        }
        assert_eq!(Stage::Failed.anchor(), 100);
    }

    #[test]
    fn test_download_scaling() {
        assert_eq!(ProgressEvent::downloading(0, Some(100)).percent, 30);
        assert_eq!(ProgressEvent::downloading(50, Some(100)).percent, 50);
        assert_eq!(ProgressEvent::downloading(100, Some(100)).percent, 70);
        assert_eq!(ProgressEvent::downloading(500, Some(100)).percent, 70);
    }

    #[test]
    fn test_unknown_size_is_indeterminate() {
        let event = ProgressEvent::downloading(12_345, None);
        assert_eq!(event.percent, 30);
        assert_eq!(event.transfer, Some(Transfer { bytes: 12_345, total: None }));
        assert_eq!(ProgressEvent::downloading(10, Some(0)).percent, 30);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |event: &ProgressEvent| seen.lock().unwrap().push(event.stage);

        sink.report(&ProgressEvent::stage(Stage::Checking, "checking"));
        NoopSink.report(&ProgressEvent::stage(Stage::Done, "done"));
        LogSink.report(&ProgressEvent::stage(Stage::Done, "done"));

        assert_eq!(*seen.lock().unwrap(), vec![Stage::Checking]);
    }
}

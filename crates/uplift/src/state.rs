use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Where the engine is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Checking,
    OfflineDegraded,
    UpToDate,
    UpdateAvailable,
    BackingUp,
    Downloading,
    Verifying,
    Extracting,
    Applying,
    CleaningUp,
    Done,
    Failed,
    RollingBack,
}

impl EngineState {
    /// States in which the installation may differ from its snapshot.
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            EngineState::BackingUp
                | EngineState::Downloading
                | EngineState::Verifying
                | EngineState::Extracting
                | EngineState::Applying
                | EngineState::CleaningUp
                | EngineState::RollingBack
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Current state plus transition logging.
#[derive(Debug, Default)]
pub(crate) struct StateCell {
    current: Mutex<EngineState>,
}

impl StateCell {
    pub fn get(&self) -> EngineState {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, next: EngineState) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != next {
            tracing::debug!(from = %*current, to = %next, "engine state");
            *current = next;
        }
    }
}

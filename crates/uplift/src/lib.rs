//! Self-update engine for an installed application.
//!
//! [`UpdateEngine`] checks a release registry for a newer version, snapshots
//! the installation, downloads and overlays the new release, and restores the
//! snapshot if anything goes wrong. When the registry cannot be reached it
//! falls back to the last release it saw and tells the user how to update by
//! hand.
//!
//! ```no_run
//! # async fn run() -> Result<(), uplift::UpdateError> {
//! use uplift::{CheckOutcome, UpdateEngine};
//!
//! let engine = UpdateEngine::open("/opt/app")?;
//! if let CheckOutcome::UpdateAvailable(update) = engine.check_for_updates().await? {
//!     let outcome = engine.apply(&update).await?;
//!     println!("{outcome:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod outcome;
mod progress;
mod state;

pub use config::{Config, DEFAULT_OWNER, DEFAULT_REPO, DEFAULT_VERSION, EngineOptions};
pub use engine::{DOWNLOAD_ACCEPT, UpdateEngine};
pub use error::{ApplyError, Result, UpdateError};
pub use outcome::{AvailableUpdate, CheckOutcome, UpdateMode, UpdateOutcome};
pub use progress::{LogSink, NoopSink, ProgressEvent, ProgressSink, Stage, Transfer};
pub use state::EngineState;

pub use uplift_install::InstallLayout;
pub use uplift_source::{RegistryEndpoints, ReleaseInfo};
pub use uplift_state::ManualUpdateInfo;
pub use uplift_verify::{AcceptAll, Sha256Verifier, Verifier};

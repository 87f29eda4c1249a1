use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::spawn_blocking;
use uplift_fetch::{FetchOptions, FetchPhase, Fetcher, HttpClient, Progress, ReqwestClient};
use uplift_fs::{InstallLock, Workspace};
use uplift_install::{
    ApplyJournal, BackupManager, BackupSnapshot, InstallLayout, RollbackController, UpdateApplier,
};
use uplift_source::{AssetResolver, ReleaseInfo, ReleaseSource};
use uplift_state::{
    CacheEntry, ManualUpdateInfo, OfflineCache, build_manual_instructions, find_manual_archive,
};
use uplift_verify::{AcceptAll, Verifier};
use uplift_version::{is_newer, normalize_tag};

use crate::config::{Config, EngineOptions};
use crate::error::{ApplyError, Result, UpdateError};
use crate::outcome::{AvailableUpdate, CheckOutcome, UpdateMode, UpdateOutcome};
use crate::progress::{LogSink, ProgressEvent, ProgressSink, Stage};
use crate::state::{EngineState, StateCell};

pub const DOWNLOAD_ACCEPT: &str = "application/octet-stream";

const FALLBACK_ARCHIVE_NAME: &str = "update.zip";

/// Checks for and applies updates to one installation root.
///
/// Both operations are `async` and meant to run on a worker task. Only one
/// of them runs at a time per engine; a second call while one is in flight
/// fails with [`UpdateError::Busy`]. Apply additionally holds a file lock so
/// two processes cannot update the same root.
pub struct UpdateEngine<C: HttpClient> {
    config: Config,
    layout: InstallLayout,
    options: EngineOptions,
    client: Arc<C>,
    backup: BackupManager,
    applier: UpdateApplier,
    rollback: RollbackController,
    cache: OfflineCache,
    verifier: Arc<dyn Verifier>,
    progress: Arc<dyn ProgressSink>,
    state: StateCell,
    flight: tokio::sync::Mutex<()>,
}

impl UpdateEngine<ReqwestClient> {
    /// Engine for the installation at `root`, configured from its
    /// `config.json` and talking to the public registry.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(root, EngineOptions::default())
    }

    pub fn open_with(root: impl Into<PathBuf>, options: EngineOptions) -> Result<Self> {
        let layout = InstallLayout::new(root);
        let config = Config::load(&layout.config_file());
        let client = ReqwestClient::new().map_err(|e| UpdateError::Config(e.to_string()))?;
        Ok(Self::new(client, layout, config, options))
    }
}

impl<C: HttpClient> UpdateEngine<C> {
    pub fn new(client: C, layout: InstallLayout, config: Config, options: EngineOptions) -> Self {
        Self {
            backup: BackupManager::new(&layout),
            applier: UpdateApplier::new(&layout),
            rollback: RollbackController::new(&layout),
            cache: OfflineCache::new(layout.cache_file()),
            client: Arc::new(client),
            verifier: Arc::new(AcceptAll),
            progress: Arc::new(LogSink),
            state: StateCell::default(),
            flight: tokio::sync::Mutex::new(()),
            config,
            layout,
            options,
        }
    }

    /// Replace the default [`LogSink`].
    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Arc::new(sink);
        self
    }

    /// Replace the default [`AcceptAll`] verifier.
    pub fn with_verifier(mut self, verifier: impl Verifier + 'static) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn state(&self) -> EngineState {
        self.state.get()
    }

    /// Ask the registry for its latest release and compare it to the
    /// installed version.
    ///
    /// Network failures never surface here: once every endpoint is exhausted
    /// the engine degrades to the offline cache and offers a cached newer
    /// release in [`UpdateMode::Manual`].
    pub async fn check_for_updates(&self) -> Result<CheckOutcome> {
        let _flight = self.flight.try_lock().map_err(|_| UpdateError::Busy)?;
        Ok(self.check().await)
    }

    async fn check(&self) -> CheckOutcome {
        self.state.set(EngineState::Checking);
        self.report(Stage::Checking, "Checking for updates");

        let current = normalize_tag(&self.config.current_version);
        let source = ReleaseSource::new(
            Arc::clone(&self.client),
            self.config.repository(),
            self.options.endpoints.clone(),
            self.options.check_options(),
        );

        match source.fetch_latest().await {
            Ok(release) => {
                if let Err(e) = self.cache.save(&release) {
                    tracing::warn!(error = %e, "failed to cache release");
                }
                if is_newer(&release.version, current) {
                    tracing::info!(current, latest = %release.version, "update available");
                    self.state.set(EngineState::UpdateAvailable);
                    CheckOutcome::UpdateAvailable(AvailableUpdate {
                        release,
                        mode: UpdateMode::Live,
                    })
                } else {
                    tracing::info!(current, latest = %release.version, "up to date");
                    self.up_to_date(current)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "registry unreachable, using offline cache");
                self.state.set(EngineState::OfflineDegraded);
                self.check_offline(current)
            }
        }
    }

    /// Compare the installed version against the cached release only,
    /// without contacting the registry.
    ///
    /// `None` when nothing has been cached yet. A newer cached release comes
    /// back in [`UpdateMode::Manual`]; anything else is up to date.
    pub fn check_cached(&self) -> Result<Option<CheckOutcome>> {
        let _flight = self.flight.try_lock().map_err(|_| UpdateError::Busy)?;
        let current = normalize_tag(&self.config.current_version);
        Ok(self
            .cache
            .load()
            .map(|entry| self.compare_cached(entry, current)))
    }

    fn check_offline(&self, current: &str) -> CheckOutcome {
        match self.cache.load() {
            Some(entry) => self.compare_cached(entry, current),
            None => self.up_to_date(current),
        }
    }

    fn compare_cached(&self, entry: CacheEntry, current: &str) -> CheckOutcome {
        if !is_newer(&entry.release.version, current) {
            return self.up_to_date(current);
        }
        tracing::info!(
            current,
            cached = %entry.release.version,
            captured_at = %entry.captured_at,
            "cached release is newer, manual update required"
        );
        let manual = build_manual_instructions(&entry.release, &self.layout.manual_dir());
        self.state.set(EngineState::UpdateAvailable);
        CheckOutcome::UpdateAvailable(AvailableUpdate {
            release: entry.release,
            mode: UpdateMode::Manual(manual),
        })
    }

    fn up_to_date(&self, current: &str) -> CheckOutcome {
        self.state.set(EngineState::UpToDate);
        CheckOutcome::UpToDate {
            current: current.to_string(),
        }
    }

    /// Install `update`.
    ///
    /// Returns `Err` only when the call was refused because another update
    /// is running; every other result is an [`UpdateOutcome`]. A failure
    /// after the backup always triggers a restore.
    pub async fn apply(&self, update: &AvailableUpdate) -> Result<UpdateOutcome> {
        let _flight = self.flight.try_lock().map_err(|_| UpdateError::Busy)?;
        let _lock = match InstallLock::try_acquire(self.layout.lock_file()) {
            Ok(lock) => lock,
            Err(uplift_fs::Error::Locked { path }) => {
                tracing::warn!(lock = %path.display(), "installation locked by another process");
                return Err(UpdateError::Busy);
            }
            Err(e) => return Ok(self.fail_before(UpdateError::Backup(e.into()))),
        };

        let manual_archive = match &update.mode {
            UpdateMode::Live => None,
            UpdateMode::Manual(info) => match find_manual_archive(&self.layout.manual_dir()) {
                Ok(Some(archive)) => {
                    tracing::info!(archive = %archive.display(), "applying manually supplied archive");
                    Some(archive)
                }
                Ok(None) => {
                    tracing::info!(dir = %self.layout.manual_dir().display(), "no manual archive found");
                    return Ok(self.manual_required(info.clone()));
                }
                Err(e) => return Ok(self.fail_before(ApplyError::ManualScan(e).into())),
            },
        };

        self.state.set(EngineState::BackingUp);
        self.report(Stage::BackingUp, "Backing up current installation");
        let backup = self.backup.clone();
        let mut snapshot = match spawn_blocking(move || backup.snapshot()).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => return Ok(self.fail_before(UpdateError::Backup(e))),
            Err(e) => return Ok(self.fail_before(e.into())),
        };

        let version = update.version();
        let mut journal = ApplyJournal::new();
        let installed = match &manual_archive {
            Some(archive) => {
                self.install_archive(archive.clone(), &mut journal, &mut snapshot)
                    .await
            }
            None => {
                self.install_live(&update.release, &mut journal, &mut snapshot)
                    .await
            }
        };

        let outcome = match installed {
            Ok(()) => self.finish(snapshot, manual_archive.as_deref(), version).await,
            Err(UpdateError::NoUsableAsset(e)) => {
                tracing::warn!(error = %e, "no downloadable archive, falling back to manual update");
                match self.roll_back(snapshot, journal).await {
                    Ok(()) => self.manual_required(build_manual_instructions(
                        &update.release,
                        &self.layout.manual_dir(),
                    )),
                    Err(rollback_error) => {
                        self.rollback_failed(UpdateError::NoUsableAsset(e), rollback_error)
                    }
                }
            }
            Err(error) => self.recover(snapshot, journal, version, error).await,
        };
        Ok(outcome)
    }

    /// Check, then apply when something newer is known.
    pub async fn check_and_apply(&self) -> Result<Option<UpdateOutcome>> {
        match self.check_for_updates().await? {
            CheckOutcome::UpToDate { .. } => Ok(None),
            CheckOutcome::UpdateAvailable(update) => self.apply(&update).await.map(Some),
        }
    }

    async fn install_live(
        &self,
        release: &ReleaseInfo,
        journal: &mut ApplyJournal,
        snapshot: &mut BackupSnapshot,
    ) -> Result<()> {
        let resolver = AssetResolver::new(
            Arc::clone(&self.client),
            self.config.repository(),
            self.options.probe_timeout,
            self.options.user_agent.clone(),
        );
        let target = resolver.resolve(release).await.map_err(UpdateError::NoUsableAsset)?;

        self.state.set(EngineState::Downloading);
        self.progress
            .report(&ProgressEvent::downloading(0, target.known_size()));

        let downloads = Workspace::new_in(self.layout.cache_dir(), "download-")
            .map_err(|e| ApplyError::Install(e.into()))?;
        let file_name = Path::new(&target.file_name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_ARCHIVE_NAME));
        let archive = downloads.join(file_name);

        let sink = Arc::clone(&self.progress);
        let options = FetchOptions::default()
            .max_attempts(self.options.download_attempts)
            .retry_backoff(self.options.download_backoff)
            .timeout(self.options.download_timeout)
            .expected_size(target.known_size())
            .header("User-Agent", self.options.user_agent.clone())
            .header("Accept", DOWNLOAD_ACCEPT)
            .on_progress(Arc::new(move |p: &Progress| {
                if p.phase == FetchPhase::Downloading {
                    sink.report(&ProgressEvent::downloading(p.bytes_downloaded, p.total_bytes));
                }
            }));

        let bytes = Fetcher::new(Arc::clone(&self.client))
            .fetch(&target.url, &archive, &options)
            .await?;
        tracing::info!(url = %target.url, bytes, "update downloaded");

        let installed = self.install_archive(archive, journal, snapshot).await;
        if let Err(e) = downloads.close() {
            tracing::warn!(error = %e, "failed to remove download directory");
        }
        installed
    }

    /// Verify, extract and overlay `archive`. The journal and snapshot are
    /// filled in even when the overlay fails part-way or panics.
    async fn install_archive(
        &self,
        archive: PathBuf,
        journal: &mut ApplyJournal,
        snapshot: &mut BackupSnapshot,
    ) -> Result<()> {
        self.state.set(EngineState::Verifying);
        let verifier = Arc::clone(&self.verifier);
        let path = archive.clone();
        let accepted = spawn_blocking(move || verifier.verify(&path))
            .await?
            .map_err(ApplyError::Verify)?;
        if !accepted {
            return Err(ApplyError::Rejected { path: archive }.into());
        }

        self.state.set(EngineState::Extracting);
        self.report(Stage::Extracting, "Extracting update");
        let applier = self.applier.clone();
        let payload = spawn_blocking(move || applier.extract(&archive))
            .await?
            .map_err(ApplyError::Install)?;

        self.state.set(EngineState::Applying);
        self.report(Stage::Applying, "Applying update");
        let applier = self.applier.clone();
        let mut recorded = journal.clone();
        let mut preserved = snapshot.clone();
        let (recorded, preserved, report) = spawn_blocking(move || {
            let report = panic::catch_unwind(AssertUnwindSafe(|| {
                applier.overlay(&payload, &mut recorded, &mut preserved)
            }));
            payload.close();
            (recorded, preserved, report)
        })
        .await?;
        *journal = recorded;
        *snapshot = preserved;

        let report = report
            .map_err(|_| ApplyError::Interrupted)?
            .map_err(ApplyError::Install)?;
        tracing::debug!(applied = ?report.applied, "payload overlaid");
        Ok(())
    }

    async fn finish(
        &self,
        mut snapshot: BackupSnapshot,
        manual_archive: Option<&Path>,
        version: &str,
    ) -> UpdateOutcome {
        self.state.set(EngineState::CleaningUp);
        self.report(Stage::Cleanup, "Cleaning up");

        let backup = self.backup.clone();
        match spawn_blocking(move || backup.discard(&mut snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to remove backup"),
            Err(e) => tracing::warn!(error = %e, "backup cleanup task failed"),
        }
        if let Some(archive) = manual_archive {
            if let Err(e) = uplift_fs::remove_entry(archive) {
                tracing::warn!(error = %e, "failed to remove applied manual archive");
            }
        }

        self.state.set(EngineState::Done);
        self.report(Stage::Done, format!("Updated to {version}"));
        tracing::info!(version, "update complete");
        UpdateOutcome::Succeeded {
            version: version.to_string(),
        }
    }

    async fn recover(
        &self,
        snapshot: BackupSnapshot,
        journal: ApplyJournal,
        version: &str,
        error: UpdateError,
    ) -> UpdateOutcome {
        self.state.set(EngineState::Failed);
        self.report(Stage::Failed, format!("Update failed: {error}"));
        tracing::error!(error = %error, "update failed, restoring backup");

        match self.roll_back(snapshot, journal).await {
            Ok(()) => {
                self.state.set(EngineState::Idle);
                UpdateOutcome::RolledBack {
                    version: version.to_string(),
                    error,
                }
            }
            Err(rollback_error) => self.rollback_failed(error, rollback_error),
        }
    }

    /// Restore the snapshot, then drop it. The snapshot is kept on disk when
    /// the restore fails or leaves an overwritten path unrestored.
    async fn roll_back(&self, snapshot: BackupSnapshot, journal: ApplyJournal) -> Result<()> {
        self.state.set(EngineState::RollingBack);
        let rollback = self.rollback.clone();
        let backup = self.backup.clone();
        spawn_blocking(move || -> Result<()> {
            let mut snapshot = snapshot;
            let report = rollback
                .restore(&snapshot, &journal)
                .map_err(UpdateError::Rollback)?;
            tracing::info!(
                restored = report.restored.len(),
                removed = report.removed.len(),
                unrecoverable = report.unrecoverable.len(),
                "installation restored"
            );
            if !report.unrecoverable.is_empty() {
                return Err(UpdateError::Rollback(uplift_install::Error::Unrecoverable {
                    paths: report.unrecoverable,
                }));
            }
            if let Err(e) = backup.discard(&mut snapshot) {
                tracing::warn!(error = %e, "failed to remove backup after restore");
            }
            Ok(())
        })
        .await?
    }

    fn rollback_failed(&self, error: UpdateError, rollback_error: UpdateError) -> UpdateOutcome {
        tracing::error!(
            error = %error,
            rollback_error = %rollback_error,
            backup = %self.layout.backup_dir().display(),
            "restore failed, manual recovery required"
        );
        self.state.set(EngineState::Idle);
        UpdateOutcome::RollbackFailed {
            error,
            rollback_error,
        }
    }

    fn manual_required(&self, info: ManualUpdateInfo) -> UpdateOutcome {
        self.state.set(EngineState::Idle);
        self.report(
            Stage::Done,
            format!("Version {} has to be installed manually", info.version),
        );
        UpdateOutcome::ManualRequired(info)
    }

    fn fail_before(&self, error: UpdateError) -> UpdateOutcome {
        self.state.set(EngineState::Failed);
        self.report(Stage::Failed, format!("Update failed: {error}"));
        tracing::error!(error = %error, "update failed before changing the installation");
        self.state.set(EngineState::Idle);
        UpdateOutcome::FailedBeforeMutation { error }
    }

    fn report(&self, stage: Stage, message: impl Into<String>) {
        self.progress.report(&ProgressEvent::stage(stage, message));
    }
}

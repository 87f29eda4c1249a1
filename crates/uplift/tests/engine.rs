//! Full check and apply runs against a local registry.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use uplift::{
    CheckOutcome, Config, EngineOptions, EngineState, InstallLayout, ProgressEvent,
    RegistryEndpoints, ReleaseInfo, Sha256Verifier, Stage, UpdateEngine, UpdateError, UpdateMode,
    UpdateOutcome,
};
use uplift_fetch::ReqwestClient;
use uplift_state::OfflineCache;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

const UNREACHABLE: &str = "http://127.0.0.1:1";

struct Install {
    _dir: TempDir,
    root: PathBuf,
}

impl Install {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("app");
        fs::create_dir_all(root.join("services")).unwrap();
        fs::write(root.join("main.py"), "VERSION = '1.0.1'").unwrap();
        fs::write(root.join("services/api.py"), "API = 1").unwrap();
        fs::write(root.join("services/legacy.py"), "LEGACY = 1").unwrap();
        fs::write(
            root.join("config.json"),
            r#"{"version": "1.0.1", "github_owner": "o", "github_repo": "r", "theme": "dark"}"#,
        )
        .unwrap();
        Self { _dir: dir, root }
    }

    fn layout(&self) -> InstallLayout {
        InstallLayout::new(&self.root)
    }

    fn engine(&self, base: &str) -> UpdateEngine<ReqwestClient> {
        let layout = self.layout();
        let config = Config::load(&layout.config_file());
        UpdateEngine::new(ReqwestClient::new().unwrap(), layout, config, options(base))
    }

    /// Every file under the root except the updater's own state.
    fn tree(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect(&self.root, &self.root, &mut files);
        files
    }
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap().to_path_buf();
        if relative == Path::new(".update_cache") {
            continue;
        }
        if entry.file_type().unwrap().is_dir() {
            collect(root, &path, files);
        } else {
            files.insert(relative, fs::read(&path).unwrap());
        }
    }
}

fn options(base: &str) -> EngineOptions {
    EngineOptions {
        endpoints: RegistryEndpoints::single(base),
        check_passes: 2,
        check_backoff: Duration::from_millis(10),
        check_timeout: Duration::from_secs(5),
        probe_timeout: Duration::from_secs(5),
        download_attempts: 1,
        download_backoff: Duration::from_millis(10),
        download_timeout: Duration::from_secs(5),
        ..EngineOptions::default()
    }
}

fn release_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, body) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn update_zip() -> Vec<u8> {
    release_zip(&[
        ("r-1.2.0/main.py", "VERSION = '1.2.0'"),
        ("r-1.2.0/services/api.py", "API = 2"),
        ("r-1.2.0/views/home.py", "HOME = 1"),
    ])
}

async fn mount_release(server: &MockServer, assets: serde_json::Value) {
    let body = serde_json::json!({
        "tag_name": "v1.2.0",
        "body": "Faster startup",
        "html_url": format!("{}/o/r/releases/tag/v1.2.0", server.uri()),
        "assets": assets,
    });
    Mock::given(method("GET"))
        .and(path("/repos/o/r/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_asset(server: &MockServer, body: Vec<u8>) -> serde_json::Value {
    let size = body.len();
    Mock::given(method("GET"))
        .and(path("/download/app-1.2.0.zip"))
        .and(header("Accept", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(server)
        .await;
    serde_json::json!([{
        "name": "app-1.2.0.zip",
        "browser_download_url": format!("{}/download/app-1.2.0.zip", server.uri()),
        "size": size,
    }])
}

type Events = Arc<Mutex<Vec<ProgressEvent>>>;

fn recording(engine: UpdateEngine<ReqwestClient>) -> (UpdateEngine<ReqwestClient>, Events) {
    let events = Events::default();
    let sink = Arc::clone(&events);
    let engine =
        engine.with_progress(move |event: &ProgressEvent| sink.lock().unwrap().push(event.clone()));
    (engine, events)
}

fn last_event(events: &Events) -> (Stage, u8) {
    let events = events.lock().unwrap();
    let last = events.last().unwrap();
    (last.stage, last.percent)
}

fn cached_release(version: &str) -> ReleaseInfo {
    ReleaseInfo {
        version: version.to_string(),
        tag: format!("v{version}"),
        notes: String::new(),
        assets: Vec::new(),
        archive_urls: vec![
            format!("https://github.com/o/r/archive/refs/tags/v{version}.zip"),
            format!("https://codeload.github.com/o/r/zip/refs/tags/v{version}"),
        ],
        source_url: format!("https://github.com/o/r/releases/tag/v{version}"),
    }
}

#[tokio::test]
async fn live_update_with_uploaded_asset() {
    let install = Install::new();
    let server = MockServer::start().await;
    let assets = mount_asset(&server, update_zip()).await;
    mount_release(&server, assets).await;

    let events = Arc::new(Mutex::new(Vec::<ProgressEvent>::new()));
    let sink = Arc::clone(&events);
    let engine = install
        .engine(&server.uri())
        .with_progress(move |event: &ProgressEvent| sink.lock().unwrap().push(event.clone()));

    let update = match engine.check_for_updates().await.unwrap() {
        CheckOutcome::UpdateAvailable(update) => update,
        other => panic!("expected an update, got {other:?}"),
    };
    assert_eq!(update.version(), "1.2.0");
    assert_eq!(update.mode, UpdateMode::Live);
    assert!(install.layout().cache_file().exists());

    let outcome = engine.apply(&update).await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Succeeded { ref version } if version == "1.2.0"));
    assert_eq!(engine.state(), EngineState::Done);

    assert_eq!(
        fs::read_to_string(install.root.join("main.py")).unwrap(),
        "VERSION = '1.2.0'"
    );
    assert_eq!(
        fs::read_to_string(install.root.join("services/api.py")).unwrap(),
        "API = 2"
    );
    assert!(!install.root.join("services/legacy.py").exists());
    assert!(install.root.join("views/home.py").exists());
    assert!(install.root.join("config.json").exists());
    assert!(!install.layout().backup_dir().exists());

    let events = events.lock().unwrap();
    let percents: Vec<u8> = events.iter().map(|e| e.percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_eq!(events.first().map(|e| e.stage), Some(Stage::Checking));
    let last = events.last().unwrap();
    assert_eq!((last.stage, last.percent), (Stage::Done, 100));
    assert!(events.iter().any(|e| e.stage == Stage::Downloading && e.percent == 70));
}

#[tokio::test]
async fn corrupt_download_is_rolled_back() {
    let install = Install::new();
    let before = install.tree();
    let server = MockServer::start().await;
    let assets = mount_asset(&server, b"PK\x03\x04 this is not an archive".to_vec()).await;
    mount_release(&server, assets).await;

    let engine = install.engine(&server.uri());
    let update = engine
        .check_for_updates()
        .await
        .unwrap()
        .available()
        .cloned()
        .unwrap();

    let outcome = engine.apply(&update).await.unwrap();
    match outcome {
        UpdateOutcome::RolledBack { version, error } => {
            assert_eq!(version, "1.2.0");
            assert!(matches!(error, UpdateError::Apply(_)), "{error:?}");
        }
        other => panic!("expected a rollback, got {other:?}"),
    }
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(install.tree(), before);
    assert!(!install.layout().backup_dir().exists());
}

#[tokio::test]
async fn digest_mismatch_is_rolled_back() {
    let install = Install::new();
    let before = install.tree();
    let server = MockServer::start().await;
    let assets = mount_asset(&server, update_zip()).await;
    mount_release(&server, assets).await;

    let verifier = Sha256Verifier::from_hex(&"00".repeat(32)).unwrap();
    let engine = install.engine(&server.uri()).with_verifier(verifier);
    let update = engine
        .check_for_updates()
        .await
        .unwrap()
        .available()
        .cloned()
        .unwrap();

    let outcome = engine.apply(&update).await.unwrap();
    assert!(
        matches!(outcome, UpdateOutcome::RolledBack { error: UpdateError::Apply(_), .. }),
        "{outcome:?}"
    );
    assert_eq!(install.tree(), before);
}

#[tokio::test]
async fn unreachable_archives_degrade_to_manual_instructions() {
    let install = Install::new();
    let before = install.tree();
    let server = MockServer::start().await;
    mount_release(&server, serde_json::json!([])).await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (engine, events) = recording(install.engine(&server.uri()));
    let update = engine
        .check_for_updates()
        .await
        .unwrap()
        .available()
        .cloned()
        .unwrap();

    match engine.apply(&update).await.unwrap() {
        UpdateOutcome::ManualRequired(info) => {
            assert_eq!(info.version, "1.2.0");
            assert_eq!(info.download_urls, update.release.archive_urls);
            assert_eq!(info.manual_dir, install.layout().manual_dir());
        }
        other => panic!("expected manual instructions, got {other:?}"),
    }
    assert_eq!(last_event(&events), (Stage::Done, 100));
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(install.tree(), before);
    assert!(!install.layout().backup_dir().exists());
}

#[tokio::test]
async fn offline_without_cache_is_up_to_date() {
    let install = Install::new();
    let engine = install.engine(UNREACHABLE);

    let outcome = engine.check_for_updates().await.unwrap();
    assert_eq!(
        outcome,
        CheckOutcome::UpToDate {
            current: "1.0.1".to_string()
        }
    );
    assert_eq!(engine.state(), EngineState::UpToDate);
}

#[tokio::test]
async fn offline_with_older_cache_is_up_to_date() {
    let install = Install::new();
    OfflineCache::new(install.layout().cache_file())
        .save(&cached_release("1.0.0"))
        .unwrap();

    let engine = install.engine(UNREACHABLE);
    let outcome = engine.check_for_updates().await.unwrap();
    assert!(matches!(outcome, CheckOutcome::UpToDate { .. }));
}

#[tokio::test]
async fn offline_with_newer_cache_requires_manual_archive() {
    let install = Install::new();
    let before = install.tree();
    let release = cached_release("1.2.0");
    OfflineCache::new(install.layout().cache_file())
        .save(&release)
        .unwrap();

    let (engine, events) = recording(install.engine(UNREACHABLE));
    let update = match engine.check_for_updates().await.unwrap() {
        CheckOutcome::UpdateAvailable(update) => update,
        other => panic!("expected a cached update, got {other:?}"),
    };
    let info = match &update.mode {
        UpdateMode::Manual(info) => info.clone(),
        UpdateMode::Live => panic!("cached update must be manual"),
    };
    assert_eq!(info.version, "1.2.0");
    assert_eq!(info.release_url, release.source_url);
    assert_eq!(info.download_urls, release.archive_urls);
    assert_eq!(info.steps.len(), 4);

    // Nothing in the manual directory yet.
    match engine.apply(&update).await.unwrap() {
        UpdateOutcome::ManualRequired(required) => assert_eq!(required, info),
        other => panic!("expected manual instructions, got {other:?}"),
    }
    assert_eq!(last_event(&events), (Stage::Done, 100));
    assert_eq!(install.tree(), before);

    let manual_dir = install.layout().manual_dir();
    fs::create_dir_all(&manual_dir).unwrap();
    let archive = manual_dir.join("r-v1.2.0.zip");
    fs::write(&archive, update_zip()).unwrap();

    let outcome = engine.apply(&update).await.unwrap();
    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(
        fs::read_to_string(install.root.join("main.py")).unwrap(),
        "VERSION = '1.2.0'"
    );
    assert!(!archive.exists());
}

#[tokio::test]
async fn apply_refuses_while_root_is_locked() {
    let install = Install::new();
    let engine = install.engine(UNREACHABLE);
    let update = uplift::AvailableUpdate {
        release: cached_release("1.2.0"),
        mode: UpdateMode::Live,
    };

    let _held = uplift_fs::InstallLock::try_acquire(install.layout().lock_file()).unwrap();
    let err = engine.apply(&update).await.unwrap_err();
    assert!(matches!(err, UpdateError::Busy));
    assert!(!install.layout().backup_dir().exists());
}

#[tokio::test]
async fn cached_check_only_offers_newer_releases() {
    let install = Install::new();
    let engine = install.engine(UNREACHABLE);
    let cache = OfflineCache::new(install.layout().cache_file());
    assert!(engine.check_cached().unwrap().is_none());

    for version in ["1.0.0", "1.0.1"] {
        cache.save(&cached_release(version)).unwrap();
        assert_eq!(
            engine.check_cached().unwrap(),
            Some(CheckOutcome::UpToDate {
                current: "1.0.1".to_string()
            }),
            "cached {version}"
        );
    }

    cache.save(&cached_release("1.2.0")).unwrap();
    let update = engine
        .check_cached()
        .unwrap()
        .and_then(|outcome| outcome.available().cloned())
        .unwrap();
    assert_eq!(update.version(), "1.2.0");
    assert!(matches!(update.mode, UpdateMode::Manual(_)));
}

#[tokio::test]
async fn calls_during_a_running_apply_are_busy() {
    let install = Install::new();
    let server = MockServer::start().await;
    let body = update_zip();
    let size = body.len();
    Mock::given(method("GET"))
        .and(path("/download/app-1.2.0.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let assets = serde_json::json!([{
        "name": "app-1.2.0.zip",
        "browser_download_url": format!("{}/download/app-1.2.0.zip", server.uri()),
        "size": size,
    }]);
    mount_release(&server, assets).await;

    let engine = install.engine(&server.uri());
    let update = engine
        .check_for_updates()
        .await
        .unwrap()
        .available()
        .cloned()
        .unwrap();

    let (first, second, check, cached) = tokio::join!(
        engine.apply(&update),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            engine.apply(&update).await
        },
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            engine.check_for_updates().await
        },
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            engine.check_cached()
        },
    );

    assert!(matches!(second, Err(UpdateError::Busy)), "{second:?}");
    assert!(matches!(check, Err(UpdateError::Busy)), "{check:?}");
    assert!(matches!(cached, Err(UpdateError::Busy)), "{cached:?}");
    assert!(first.unwrap().is_success());
    assert_eq!(engine.state(), EngineState::Done);
}

#[cfg(unix)]
#[tokio::test]
async fn failed_overlay_restores_files_outside_the_backup_list() {
    let install = Install::new();
    fs::write(install.root.join("extra.txt"), "local notes").unwrap();
    // Opening a socket for copying fails, so the overlay stops at it.
    let _socket = std::os::unix::net::UnixListener::bind(install.root.join("zz.sock")).unwrap();

    let server = MockServer::start().await;
    let archive = release_zip(&[
        ("r-1.2.0/extra.txt", "shipped"),
        ("r-1.2.0/main.py", "VERSION = '1.2.0'"),
        ("r-1.2.0/zz.sock", "plain file"),
    ]);
    let assets = mount_asset(&server, archive).await;
    mount_release(&server, assets).await;

    let engine = install.engine(&server.uri());
    let update = engine
        .check_for_updates()
        .await
        .unwrap()
        .available()
        .cloned()
        .unwrap();

    let outcome = engine.apply(&update).await.unwrap();
    assert!(
        matches!(outcome, UpdateOutcome::RolledBack { error: UpdateError::Apply(_), .. }),
        "{outcome:?}"
    );
    assert_eq!(
        fs::read_to_string(install.root.join("extra.txt")).unwrap(),
        "local notes"
    );
    assert_eq!(
        fs::read_to_string(install.root.join("main.py")).unwrap(),
        "VERSION = '1.0.1'"
    );
    assert!(!install.layout().backup_dir().exists());
}

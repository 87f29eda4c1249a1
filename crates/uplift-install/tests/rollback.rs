use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use uplift_install::{
    ApplyJournal, BACKUP_DIR, BackupManager, CACHE_DIR, InstallLayout, RollbackController,
    UpdateApplier,
};
use zip::write::SimpleFileOptions;

/// Every file and directory under `root` except the updater's own
/// directories, with file contents.
fn tree(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Option<Vec<u8>>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let rel = path.strip_prefix(root).unwrap().to_path_buf();
            if rel.starts_with(BACKUP_DIR) || rel.starts_with(CACHE_DIR) {
                continue;
            }
            if path.is_dir() {
                out.insert(rel, None);
                walk(root, &path, out);
            } else {
                out.insert(rel, Some(fs::read(&path).unwrap()));
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

fn populate(root: &Path) {
    fs::create_dir_all(root.join("services/providers")).unwrap();
    fs::create_dir_all(root.join("views")).unwrap();
    fs::write(root.join("main.py"), "import services\n").unwrap();
    fs::write(root.join("services/providers/a.py"), [0u8, 159, 146, 150]).unwrap();
    fs::write(root.join("services/api.py"), "API = 1\n").unwrap();
    fs::write(root.join("views/home.py"), "").unwrap();
    fs::write(root.join("config.json"), r#"{"version": "1.0.1"}"#).unwrap();
    fs::write(root.join("requirements.txt"), "requests\n").unwrap();
}

fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, body) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

#[test]
fn snapshot_then_restore_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path());
    let before = tree(dir.path());

    let layout = InstallLayout::new(dir.path());
    let snapshot = BackupManager::new(&layout).snapshot().unwrap();
    RollbackController::new(&layout)
        .restore(&snapshot, &ApplyJournal::new())
        .unwrap();

    assert_eq!(tree(dir.path()), before);
}

#[test]
fn applied_update_is_rolled_back_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("install");
    fs::create_dir_all(&root).unwrap();
    populate(&root);
    let before = tree(&root);

    let archive = dir.path().join("MJ-translate-v1.2.0.zip");
    write_zip(
        &archive,
        &[
            ("MJ-translate-1.2.0/main.py", "import services, plugins\n"),
            ("MJ-translate-1.2.0/services/api.py", "API = 2\n"),
            ("MJ-translate-1.2.0/plugins/__init__.py", ""),
            ("MJ-translate-1.2.0/requirements.txt", "requests\nzip\n"),
        ],
    );

    let layout = InstallLayout::new(&root);
    let manager = BackupManager::new(&layout);
    let mut snapshot = manager.snapshot().unwrap();

    let mut journal = ApplyJournal::new();
    UpdateApplier::new(&layout)
        .apply(&archive, &mut journal, &mut snapshot)
        .unwrap();
    assert_ne!(tree(&root), before);

    // A later stage fails; undo everything.
    let report = RollbackController::new(&layout)
        .restore(&snapshot, &journal)
        .unwrap();
    assert!(report.unrecoverable.is_empty());
    assert_eq!(tree(&root), before);

    manager.discard(&mut snapshot).unwrap();
    assert!(!layout.backup_dir().exists());
}

#[test]
fn overwritten_file_outside_allow_list_is_restored() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("install");
    fs::create_dir_all(&root).unwrap();
    populate(&root);
    fs::write(root.join("extra.txt"), "kept by the user\n").unwrap();
    let before = tree(&root);

    let archive = dir.path().join("update.zip");
    write_zip(
        &archive,
        &[("app/extra.txt", "shipped\n"), ("app/main.py", "import plugins\n")],
    );

    let layout = InstallLayout::new(&root);
    let mut snapshot = BackupManager::new(&layout).snapshot().unwrap();
    let mut journal = ApplyJournal::new();
    UpdateApplier::new(&layout)
        .apply(&archive, &mut journal, &mut snapshot)
        .unwrap();
    assert_eq!(fs::read_to_string(root.join("extra.txt")).unwrap(), "shipped\n");

    let report = RollbackController::new(&layout)
        .restore(&snapshot, &journal)
        .unwrap();
    assert!(report.unrecoverable.is_empty());
    assert!(report.restored.contains(&PathBuf::from("extra.txt")));
    assert_eq!(tree(&root), before);
}

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use fsaudit_core::{
    Broker, DiffEngine, FileRecord, FileState, ScanOptions, WATCH_TOPIC,
    ids::identity_for,
};
use tempfile::tempdir;

fn write_with_mtime(path: &Path, secs: u64) {
    fs::write(path, b"content").expect("write file");
    set_mtime(path, secs);
}

fn set_mtime(path: &Path, secs: u64) {
    File::options()
        .write(true)
        .open(path)
        .expect("open for mtime")
        .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .expect("set mtime");
}

/// Drain the watch topic and decode every payload.
async fn take_records(broker: &Broker) -> Vec<FileRecord> {
    let events = broker.pending(WATCH_TOPIC).await;
    broker.clean(WATCH_TOPIC).await;
    events
        .iter()
        .map(|event| FileRecord::from_json(&event.payload).expect("decodes"))
        .collect()
}

fn setup() -> (Arc<Broker>, DiffEngine) {
    let broker = Arc::new(Broker::new().expect("broker"));
    let engine = DiffEngine::new(broker.clone(), ScanOptions::default());
    (broker, engine)
}

#[tokio::test]
async fn first_scan_reports_every_file_as_new() {
    let tmp = tempdir().expect("tempdir");
    fs::create_dir_all(tmp.path().join("sub/inner")).unwrap();
    write_with_mtime(&tmp.path().join("one.txt"), 1_600_000_000);
    write_with_mtime(&tmp.path().join("sub/two.txt"), 1_600_000_000);
    write_with_mtime(&tmp.path().join("sub/inner/three.txt"), 1_600_000_000);

    let (broker, mut engine) = setup();
    let report = engine.scan(tmp.path()).await.expect("scan");

    let records = take_records(&broker).await;
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.state == FileState::New && r.changed));
    assert_eq!(engine.len(), 3);
    assert_eq!(report.new, 3);
    assert_eq!(report.published, 3);
    assert!(report.errors.is_empty());
    assert!(
        records
            .iter()
            .all(|r| Some(r.scan_token.as_str()) == engine.scan_token())
    );
}

#[tokio::test]
async fn rescanning_an_unchanged_tree_is_silent() {
    let tmp = tempdir().expect("tempdir");
    write_with_mtime(&tmp.path().join("a.txt"), 1_600_000_000);
    write_with_mtime(&tmp.path().join("b.txt"), 1_600_000_100);

    let (broker, mut engine) = setup();
    engine.scan(tmp.path()).await.unwrap();
    take_records(&broker).await;
    let first_token = engine.scan_token().map(str::to_string);

    let report = engine.scan(tmp.path()).await.unwrap();

    assert_eq!(broker.pending_len(WATCH_TOPIC).await, 0);
    assert_eq!(report.unchanged, 2);
    assert_eq!(report.published, 0);
    assert_ne!(engine.scan_token().map(str::to_string), first_token);
    let token = engine.scan_token().unwrap();
    assert!(engine.snapshot().values().all(|r| r.scan_token == token));
}

#[tokio::test]
async fn new_modified_deleted_lifecycle() {
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("a.txt");
    write_with_mtime(&file, 1_600_000_000);
    let identity = identity_for("a.txt");

    let (broker, mut engine) = setup();

    engine.scan(tmp.path()).await.unwrap();
    let records = take_records(&broker).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "a.txt");
    assert_eq!(records[0].state, FileState::New);
    let first_fingerprint = engine.get(&identity).unwrap().change_fingerprint.clone();

    set_mtime(&file, 1_600_000_060);
    engine.scan(tmp.path()).await.unwrap();
    let records = take_records(&broker).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "a.txt");
    assert_eq!(records[0].state, FileState::Modified);
    assert!(records[0].changed);
    let updated = engine.get(&identity).unwrap();
    assert_ne!(updated.change_fingerprint, first_fingerprint);
    assert_eq!(updated.change_fingerprint, records[0].change_fingerprint);

    fs::remove_file(&file).unwrap();
    let report = engine.scan(tmp.path()).await.unwrap();
    let records = take_records(&broker).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "a.txt");
    assert_eq!(records[0].state, FileState::Deleted);
    assert_eq!(report.deleted, 1);
    assert!(engine.is_empty());
    assert!(engine.get(&identity).is_none());

    engine.scan(tmp.path()).await.unwrap();
    assert_eq!(broker.pending_len(WATCH_TOPIC).await, 0);
}

#[tokio::test]
async fn deletions_are_published_before_additions() {
    let tmp = tempdir().expect("tempdir");
    write_with_mtime(&tmp.path().join("old.txt"), 1_600_000_000);

    let (broker, mut engine) = setup();
    engine.scan(tmp.path()).await.unwrap();
    take_records(&broker).await;

    fs::remove_file(tmp.path().join("old.txt")).unwrap();
    write_with_mtime(&tmp.path().join("fresh.txt"), 1_600_000_000);
    engine.scan(tmp.path()).await.unwrap();

    let records = take_records(&broker).await;
    let summary: Vec<(&str, FileState)> = records
        .iter()
        .map(|r| (r.name.as_str(), r.state))
        .collect();
    assert_eq!(
        summary,
        [("old.txt", FileState::Deleted), ("fresh.txt", FileState::New)]
    );
}

#[tokio::test]
async fn only_the_touched_file_is_reported_as_modified() {
    let tmp = tempdir().expect("tempdir");
    write_with_mtime(&tmp.path().join("keep.txt"), 1_600_000_000);
    write_with_mtime(&tmp.path().join("edit.txt"), 1_600_000_000);

    let (broker, mut engine) = setup();
    engine.scan(tmp.path()).await.unwrap();
    take_records(&broker).await;

    set_mtime(&tmp.path().join("edit.txt"), 1_600_000_005);
    let report = engine.scan(tmp.path()).await.unwrap();

    let records = take_records(&broker).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "edit.txt");
    assert_eq!(records[0].state, FileState::Modified);
    assert_eq!(report.unchanged, 1);
}

#[tokio::test]
async fn custom_topic_routes_events() {
    let tmp = tempdir().expect("tempdir");
    write_with_mtime(&tmp.path().join("a.txt"), 1_600_000_000);

    let broker = Arc::new(Broker::new().unwrap());
    let options = ScanOptions {
        topic: "audit".to_string(),
        ..ScanOptions::default()
    };
    let mut engine = DiffEngine::new(broker.clone(), options);
    engine.scan(tmp.path()).await.unwrap();

    assert_eq!(broker.pending_len("audit").await, 1);
    assert_eq!(broker.pending_len(WATCH_TOPIC).await, 0);
    let event = &broker.pending("audit").await[0];
    assert_eq!(event.topic, "audit");
}

#[tokio::test]
async fn missing_root_reports_error_and_forgets_files() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("watched");
    fs::create_dir(&root).unwrap();
    write_with_mtime(&root.join("a.txt"), 1_600_000_000);

    let (broker, mut engine) = setup();
    engine.scan(&root).await.unwrap();
    take_records(&broker).await;

    fs::remove_dir_all(&root).unwrap();
    let report = engine.scan(&root).await.expect("walk errors are not fatal");

    assert_eq!(report.errors.len(), 1);
    let records = take_records(&broker).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state, FileState::Deleted);
}

#[cfg(unix)]
#[tokio::test]
async fn walk_error_skips_only_the_failing_branch() {
    use fsaudit_core::WalkOptions;

    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("watched");
    fs::create_dir_all(root.join("sub")).unwrap();
    write_with_mtime(&root.join("a.txt"), 1_600_000_000);
    write_with_mtime(&root.join("sub/b.txt"), 1_600_000_000);
    write_with_mtime(&root.join("z.txt"), 1_600_000_000);
    std::os::unix::fs::symlink(&root, root.join("sub/loop")).unwrap();

    let broker = Arc::new(Broker::new().expect("broker"));
    let options = ScanOptions {
        walk: WalkOptions {
            follow_links: true,
            max_depth: None,
        },
        ..ScanOptions::default()
    };
    let mut engine = DiffEngine::new(broker.clone(), options);
    let report = engine.scan(&root).await.expect("walk errors are not fatal");

    assert_eq!(report.files_seen, 3);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("loop"), "{:?}", report.errors);

    let mut names: Vec<String> = take_records(&broker)
        .await
        .into_iter()
        .map(|r| r.name)
        .collect();
    names.sort();
    assert_eq!(names, ["a.txt", "b.txt", "z.txt"]);
}

#[tokio::test]
async fn same_name_with_different_mtimes_flaps_between_scans() {
    let tmp = tempdir().expect("tempdir");
    fs::create_dir_all(tmp.path().join("l")).unwrap();
    fs::create_dir_all(tmp.path().join("r")).unwrap();
    write_with_mtime(&tmp.path().join("l/n.md"), 1_600_000_000);
    write_with_mtime(&tmp.path().join("r/n.md"), 1_600_000_500);

    let (broker, mut engine) = setup();

    let states = |records: Vec<FileRecord>| -> Vec<FileState> {
        records.into_iter().map(|r| r.state).collect()
    };

    engine.scan(tmp.path()).await.unwrap();
    assert_eq!(
        states(take_records(&broker).await),
        [FileState::New, FileState::Modified]
    );

    // The tree does not change, yet both files keep overwriting the one
    // shared snapshot entry.
    for _ in 0..2 {
        let report = engine.scan(tmp.path()).await.unwrap();
        assert_eq!(report.modified, 2);
        assert_eq!(
            states(take_records(&broker).await),
            [FileState::Modified, FileState::Modified]
        );
    }
    assert_eq!(engine.len(), 1);
}

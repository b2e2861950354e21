//! Folder pipeline tests
//!
//! Real filesystem discovery and reading (FsScriptSource) feeding the folder
//! processor, with a recording gateway in place of MySQL.

use sqlwatch_core::application::{DiscoveryPolicy, FolderProcessor};
use sqlwatch_core::domain::{FileOutcome, FolderOutcome, FolderTask};
use sqlwatch_core::port::execution_gateway::mocks::MockExecutionGateway;
use sqlwatch_core::port::time_provider::SystemTimeProvider;
use sqlwatch_infra_fs::FsScriptSource;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn fast_policy() -> DiscoveryPolicy {
    DiscoveryPolicy::new(Duration::from_millis(50), Duration::from_secs(3))
}

fn processor(gateway: &MockExecutionGateway, policy: DiscoveryPolicy) -> FolderProcessor {
    FolderProcessor::new(
        Arc::new(FsScriptSource::new()),
        Arc::new(gateway.clone()),
        Arc::new(SystemTimeProvider),
        policy,
    )
}

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[tokio::test]
async fn test_files_run_in_sorted_path_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b/010_views.sql", "CREATE VIEW v AS SELECT 1;");
    write(dir.path(), "002_seed.sql", "INSERT INTO t VALUES ('a;b');\nINSERT INTO t VALUES (2);");
    write(dir.path(), "001_schema.sql", "-- schema\nCREATE TABLE t (x TEXT);");
    write(dir.path(), "notes.txt", "DROP TABLE t;");

    let gateway = MockExecutionGateway::new();
    let report = processor(&gateway, fast_policy())
        .process_folder(&FolderTask::new(dir.path()))
        .await;

    assert_eq!(report.committed_count(), 3);
    assert_eq!(
        gateway.committed(),
        vec![
            vec!["-- schema\nCREATE TABLE t (x TEXT)".to_string()],
            vec![
                "INSERT INTO t VALUES ('a;b')".to_string(),
                "INSERT INTO t VALUES (2)".to_string(),
            ],
            vec!["CREATE VIEW v AS SELECT 1".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_failed_file_does_not_stop_the_folder() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "001_bad.sql", "INSERT INTO a VALUES (1);\nBROKEN STATEMENT;");
    write(dir.path(), "002_good.sql", "INSERT INTO b VALUES (1);");

    let gateway = MockExecutionGateway::new_failing_on("BROKEN");
    let report = processor(&gateway, fast_policy())
        .process_folder(&FolderTask::new(dir.path()))
        .await;

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.committed_count(), 1);
    assert_eq!(
        gateway.rolled_back(),
        vec![vec![
            "INSERT INTO a VALUES (1)".to_string(),
            "BROKEN STATEMENT".to_string(),
        ]]
    );
    assert_eq!(
        gateway.committed(),
        vec![vec!["INSERT INTO b VALUES (1)".to_string()]]
    );

    let files = report.files();
    match &files[0].outcome {
        FileOutcome::Failed { reason } => assert!(reason.contains("Statement 2"), "{}", reason),
        other => panic!("expected failure, got {}", other),
    }
}

#[tokio::test]
async fn test_waits_for_late_scripts() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().to_path_buf();

    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        // Renamed into place so discovery never sees a half-written file
        write(&folder, "001_late.tmp", "SELECT 1;");
        fs::rename(folder.join("001_late.tmp"), folder.join("001_late.sql")).unwrap();
    });

    let gateway = MockExecutionGateway::new();
    let report = processor(&gateway, fast_policy())
        .process_folder(&FolderTask::new(dir.path()))
        .await;
    writer.await.unwrap();

    assert_eq!(report.committed_count(), 1);
    assert_eq!(gateway.committed(), vec![vec!["SELECT 1".to_string()]]);
}

#[tokio::test]
async fn test_empty_folder_gives_up_after_max_wait() {
    let dir = TempDir::new().unwrap();
    let policy = DiscoveryPolicy::new(Duration::from_millis(50), Duration::from_millis(300));

    let gateway = MockExecutionGateway::new();
    let started = Instant::now();
    let report = processor(&gateway, policy)
        .process_folder(&FolderTask::new(dir.path()))
        .await;

    assert!(matches!(report.outcome, FolderOutcome::NoScripts));
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(gateway.ensure_calls(), 0);
}

#[tokio::test]
async fn test_unreadable_script_is_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("001_binary.sql"), [0xffu8, 0xfe, 0x00]).unwrap();
    write(dir.path(), "002_ok.sql", "SELECT 2;");

    let gateway = MockExecutionGateway::new();
    let report = processor(&gateway, fast_policy())
        .process_folder(&FolderTask::new(dir.path()))
        .await;

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.committed_count(), 1);
    assert_eq!(gateway.committed(), vec![vec!["SELECT 2".to_string()]]);
}

#[tokio::test]
async fn test_missing_folder_fails_discovery() {
    let dir = TempDir::new().unwrap();
    let gateway = MockExecutionGateway::new();

    let report = processor(&gateway, fast_policy())
        .process_folder(&FolderTask::new(dir.path().join("vanished")))
        .await;

    assert!(matches!(report.outcome, FolderOutcome::DiscoveryFailed(_)));
    assert!(gateway.committed().is_empty());
}

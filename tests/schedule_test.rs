mod common;

use common::{files_under, MemoryConnector};
use ftp_sync::core::schedule::run_scheduled;
use chrono::NaiveTime;
use ftp_sync::{SyncEngine, SyncError, SyncMode};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const HOST: &str = "ftp2.psl.noaa.gov";
const CWD: &str = "Datasets/cpc_global_precip";

fn noaa() -> MemoryConnector {
    MemoryConnector::new().with_dir(HOST, CWD, &[("precip.1979.nc", "precip-1979")])
}

fn midnight() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).unwrap()
}

#[tokio::test]
async fn test_bad_csv_is_rejected_before_scheduling() {
    let temp_dir = TempDir::new().unwrap();
    let csv = temp_dir.path().join("jobs.csv");
    fs::write(&csv, "host,user,passwd,local_root,file_reg\nftp2.psl.noaa.gov,,,/tmp,\n").unwrap();
    let connector = noaa();
    let engine = SyncEngine::new(connector.clone(), 1, SyncMode::Auto);

    // Never stops on its own: only an early error can end it in time.
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_scheduled(&engine, &csv, midnight(), std::future::pending()),
    )
    .await
    .expect("scheduler kept running with a bad CSV");

    match result {
        Err(SyncError::MissingColumnError { column, .. }) => assert_eq!(column, "cwd"),
        other => panic!("expected missing column, got {:?}", other),
    }
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_first_scheduled_run_syncs_right_away() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("data");
    let csv = temp_dir.path().join("jobs.csv");
    fs::write(
        &csv,
        format!(
            "host,user,passwd,cwd,local_root,file_reg\n{},,,{},{},\n",
            HOST,
            CWD,
            root.display()
        ),
    )
    .unwrap();
    let target = root.join(CWD).join("precip.1979.nc");
    let engine = SyncEngine::new(noaa(), 1, SyncMode::Auto);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_scheduled(&engine, &csv, midnight(), wait_for(&target)),
    )
    .await
    .expect("scheduler did not stop");

    assert!(result.is_ok());
    assert_eq!(fs::read(&target).unwrap(), b"precip-1979");
    assert_eq!(files_under(&root).len(), 1);
}

/// Resolves once `path` exists.
async fn wait_for(path: &Path) {
    while !path.exists() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}


use chrono::{TimeZone, Utc};

use ondemand_agent::capability::spool::SpoolExporter;
use ondemand_agent::capability::{ExportPipeline, ProfileWindow, Snapshot};

fn snapshot() -> Snapshot {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 30).unwrap();
    Snapshot {
        window: ProfileWindow::new(start, end),
        payload: br#"{"utime_ticks":4}"#.to_vec(),
    }
}

#[test]
fn file_name_encodes_both_window_bounds() {
    let name = SpoolExporter::file_name(&snapshot());
    assert_eq!(name, "profile_20260301T120000.000_20260301T120030.000.json");
}

#[test]
fn new_creates_the_spool_directory() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path().join("nested").join("spool");
    let _exporter = SpoolExporter::new(&dir).expect("creates directory");
    assert!(dir.is_dir());
}

#[tokio::test]
async fn export_writes_the_payload() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let exporter = SpoolExporter::new(tmp.path()).expect("spool dir");

    let snapshot = snapshot();
    let expected = tmp.path().join(SpoolExporter::file_name(&snapshot));
    exporter.export(snapshot).await.expect("export succeeds");

    let written = std::fs::read(expected).expect("spooled file exists");
    assert_eq!(written, br#"{"utime_ticks":4}"#);
}

#[tokio::test]
async fn export_into_unwritable_dir_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path().join("gone");
    let exporter = SpoolExporter::new(&dir).expect("spool dir");
    std::fs::remove_dir(&dir).expect("remove spool dir");

    let err = exporter.export(snapshot()).await.unwrap_err();
    assert!(matches!(err, ondemand_agent::AppError::Export(_)));
}

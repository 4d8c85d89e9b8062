use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn writes_log_file_and_ignores_reinit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("overlay.log");

    asset_overlay::logging::init(true, Some(&path));
    tracing::info!("first");

    // A second init keeps the file subscriber in place.
    asset_overlay::logging::init(false, None);
    tracing::info!("second");

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("first"));
    assert!(contents.contains("second"));
    assert!(!contents.contains('\u{1b}'), "file output should not carry ANSI codes");
}

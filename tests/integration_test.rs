//! End-to-end tests driving the built binary
//!
//! Lease breaks deliver SIGIO to the whole process, so the signalling
//! cases run in a separate process rather than inside the test harness.

use std::os::unix::fs::PermissionsExt;
use std::process::Command;

fn setlease_check() -> Command {
    Command::new(env!("CARGO_BIN_EXE_setlease-check"))
}

#[test]
fn test_full_matrix_passes_on_fresh_path() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("leasefile");

    let output = setlease_check()
        .arg(&path)
        .output()
        .expect("Failed to execute setlease-check");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let meta = std::fs::metadata(&path).expect("target file should be left behind");
    assert_eq!(meta.permissions().mode() & 0o777, 0o644);
    assert_eq!(meta.len(), 0);
}

#[test]
fn test_existing_file_is_reused() {
    // 書き込みリースは他のopenがあると拒否されるので、ファイルは閉じておく
    let path = tempfile::NamedTempFile::new()
        .expect("Failed to create temp file")
        .into_temp_path();

    let status = setlease_check()
        .arg(&*path)
        .status()
        .expect("Failed to execute setlease-check");

    assert!(status.success());
}

#[test]
fn test_missing_argument_prints_usage() {
    let output = setlease_check()
        .output()
        .expect("Failed to execute setlease-check");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Usage: setlease-check <filename>"));
}

#[test]
fn test_unopenable_path_reports_first_case() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("no/such/dir/leasefile");

    let output = setlease_check()
        .arg(&path)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute setlease-check");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let expected = format!(
        "Test failure: openflags={} leasetype={} conf_openflags={} expect_signal=0",
        libc::O_RDONLY,
        libc::F_RDLCK,
        libc::O_RDONLY
    );
    // 既定のログフィルタでは診断行の1行だけが出力される
    let lines: Vec<&str> = stderr.lines().collect();
    assert_eq!(lines, vec![expected.as_str()], "stderr: {stderr:?}");
    assert!(!stderr.contains('\u{1b}'));
    assert!(!path.exists());
}

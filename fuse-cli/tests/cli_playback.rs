use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_sample_score(path: &std::path::Path) {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"FUSE");
    bytes.push(2);
    bytes.extend_from_slice(&0x0001u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.push(0);
    bytes.push(0);
    bytes.extend_from_slice(&[0xFF, 0xFF]);
    bytes.extend_from_slice(&50u32.to_le_bytes());
    bytes.push(0);
    bytes.push(3);
    bytes.extend_from_slice(&[0xFF, 0xFF]);
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(&bytes).unwrap();
}

#[test]
fn play_flag_runs_to_completion_on_loopback() {
    let dir = tempfile::tempdir().unwrap();
    let score_path = dir.path().join("score.fuse");
    write_sample_score(&score_path);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fuse"));
    cmd.args([
        score_path.to_str().unwrap(),
        "--play",
        "--fuse-duration-ms",
        "5",
        "--time-resolution-ms",
        "5",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Stopped"));
}

#[test]
fn rejects_missing_score_file() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fuse"));
    cmd.args(["/nonexistent/path.fuse", "--play"])
        .assert()
        .failure();
}

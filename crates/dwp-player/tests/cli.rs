// Allow deprecated APIs (assert_cmd::cargo_bin is deprecated but still works)
#![allow(deprecated)]

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

fn script(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn snapshot_command(script: &NamedTempFile, output: &std::path::Path, seconds: &str) -> Command {
    let mut cmd = Command::cargo_bin("dwplay").unwrap();
    cmd.arg(script.path())
        .args(["--width", "64", "--height", "32", "--fps", "10"])
        .args(["--snapshot", seconds])
        .arg("--output")
        .arg(output);
    cmd
}

#[test]
fn test_missing_script_exits_1() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    Command::cargo_bin("dwplay")?
        .arg(dir.path().join("nope.js"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read script"));
    Ok(())
}

#[test]
fn test_compile_error_exits_1() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let source = script("x.fillRect(0, 0,");
    snapshot_command(&source, &dir.path().join("out.png"), "0")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Syntax error"));
    assert!(!dir.path().join("out.png").exists());
    Ok(())
}

#[test]
fn test_snapshot_writes_png() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let output = dir.path().join("frame.png");
    let source = script("x.fillStyle = R(255, 0, 0); x.fillRect(0, 0, 32 * t, 32)");

    snapshot_command(&source, &output, "1").assert().success();

    let bytes = std::fs::read(&output)?;
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
    Ok(())
}

#[test]
fn test_script_fault_exits_0() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let output = dir.path().join("frame.png");
    let source = script("x.fillRect(0, 0, 8, 8); if (t > 0.3) throw new Error('threshold passed')");

    snapshot_command(&source, &output, "5")
        .assert()
        .success()
        .stderr(predicate::str::contains("threshold passed"));
    assert!(output.exists());
    Ok(())
}

#[test]
fn test_console_goes_to_log() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let source = script("if (t == 0) console.log('hello from u')");

    snapshot_command(&source, &dir.path().join("frame.png"), "0")
        .assert()
        .success()
        .stderr(predicate::str::contains("hello from u"));
    Ok(())
}

#[test]
fn test_negative_snapshot_time_exits_1() {
    let dir = TempDir::new().unwrap();
    let source = script("");
    snapshot_command(&source, &dir.path().join("frame.png"), "-1")
        .assert()
        .code(1);
}

#[test]
fn test_no_arguments_exits_1() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("dwplay")?
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn test_help_exits_0() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("dwplay")?
        .arg("--help")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("--snapshot"));
    Ok(())
}

#[test]
fn test_non_utf8_script_still_runs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let output = dir.path().join("frame.png");
    let mut source = NamedTempFile::new()?;
    source.write_all(b"// caf\xe9\nx.fillRect(0, 0, 8, 8)")?;

    snapshot_command(&source, &output, "0")
        .assert()
        .success()
        .stderr(predicate::str::contains("not valid UTF-8"));
    assert!(output.exists());
    Ok(())
}

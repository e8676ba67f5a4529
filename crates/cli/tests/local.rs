//! End-to-end tests of the ufs binary against the local filesystem
//!
//! These need no object store; every test runs with an isolated, empty
//! config directory.

use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::io::Write;

use tempfile::TempDir;

fn run_ufs(args: &[&str], config_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ufs"))
        .args(args)
        .env("UFS_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute ufs command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Config dir plus a `src/` tree with `a.txt` and `sub/b.txt`
fn fixture() -> (TempDir, TempDir) {
    let config = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(data.path().join("src/sub")).unwrap();
    std::fs::write(data.path().join("src/a.txt"), b"alpha").unwrap();
    std::fs::write(data.path().join("src/sub/b.txt"), b"beta").unwrap();
    (config, data)
}

fn at(dir: &TempDir, rest: &str) -> String {
    format!("{}/{rest}", dir.path().display())
}

#[test]
fn ls_recursive_json() {
    let (config, data) = fixture();
    let output = run_ufs(&["ls", &at(&data, "src/"), "-r", "--json"], config.path());
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files: Vec<&str> = json["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(files, vec![at(&data, "src/a.txt"), at(&data, "src/sub/b.txt")]);
}

#[test]
fn cp_then_checksum() {
    let (config, data) = fixture();
    let output = run_ufs(
        &["cp", "-r", &at(&data, "src/"), &at(&data, "dst/")],
        config.path(),
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(data.path().join("dst/src/sub/b.txt").exists());

    // copying again without --dir-exist-ok is a conflict
    let output = run_ufs(
        &["cp", "-r", &at(&data, "src/"), &at(&data, "dst/")],
        config.path(),
    );
    assert_eq!(output.status.code(), Some(6));

    let output = run_ufs(
        &["checksum", &at(&data, "dst/src/a.txt"), "--algorithm", "md5"],
        config.path(),
    );
    assert!(output.status.success());
    assert!(stdout(&output).starts_with(&format!("{:x}", md5::compute(b"alpha"))));
}

#[test]
fn archive_infers_format() {
    let (config, data) = fixture();
    let output = run_ufs(
        &["archive", &at(&data, "src/"), &at(&data, "out.tar.gz"), "--json"],
        config.path(),
    );
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["format"], "gztar");
    assert_eq!(json["entries"], 2);

    let output = run_ufs(
        &["archive", &at(&data, "src/"), &at(&data, "out.zip"), "--format", "gztar"],
        config.path(),
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(!data.path().join("out.zip").exists());
}

#[test]
fn rm_dry_run_then_remove() {
    let (config, data) = fixture();
    let output = run_ufs(&["rm", "-r", "--dry-run", &at(&data, "src/")], config.path());
    assert!(output.status.success());
    assert!(stdout(&output).contains("Would remove"));
    assert!(data.path().join("src/a.txt").exists());

    let output = run_ufs(&["rm", &at(&data, "src/")], config.path());
    assert_eq!(output.status.code(), Some(2));

    let output = run_ufs(&["rm", "-r", &at(&data, "src/")], config.path());
    assert!(output.status.success());
    assert!(!data.path().join("src").exists());

    let output = run_ufs(&["rm", "-r", "-f", &at(&data, "src/")], config.path());
    assert!(output.status.success());
}

#[test]
fn put_appends_and_cat_reads_back() {
    let (config, data) = fixture();
    let target = at(&data, "notes.txt");

    for (text, extra) in [("one\n", None), ("two\n", Some("--append"))] {
        let mut args = vec!["put", target.as_str()];
        args.extend(extra);
        let mut child = Command::new(env!("CARGO_BIN_EXE_ufs"))
            .args(&args)
            .env("UFS_CONFIG_DIR", config.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        child.stdin.take().unwrap().write_all(text.as_bytes()).unwrap();
        assert!(child.wait().unwrap().success());
    }

    let output = run_ufs(&["cat", &target], config.path());
    assert_eq!(stdout(&output), "one\ntwo\n");
}

#[test]
fn error_exit_codes() {
    let (config, data) = fixture();

    let output = run_ufs(&["stat", &at(&data, "missing.txt")], config.path());
    assert_eq!(output.status.code(), Some(5));

    let output = run_ufs(&["cat", "relative/path.txt"], config.path());
    assert_eq!(output.status.code(), Some(2));

    let output = run_ufs(&["cat", "gs://bucket/key"], config.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn completions_print_a_script() {
    let config = tempfile::tempdir().unwrap();
    let output = run_ufs(&["completions", "bash"], config.path());
    assert!(output.status.success());
    assert!(stdout(&output).contains("ufs"));
}

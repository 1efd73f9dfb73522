//! Binary-level tests: argument handling, direction heuristic, exit codes
//! and the destination file contents.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn mergelog() -> Command {
    let mut cmd = Command::cargo_bin("mergelog").expect("binary built");
    // Isolate from whatever VCS launched the test runner.
    cmd.env_remove("GIT_DOWNSTREAM");
    cmd.env_remove("GIT_UPSTREAM");
    cmd.env_remove("GIT_REFLOG_ACTION");
    cmd
}

fn entry(date: &str, body: &str) -> String {
    format!("{date}  Jane Doe  <jane@example.net>\n\n\t* {body}\n\n")
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

// ---------------------------------------------------------------------------
// Argument handling
// ---------------------------------------------------------------------------

#[test]
fn version_flag_prints_and_exits_zero() {
    mergelog()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mergelog"));
}

#[test]
fn help_names_the_three_operands() {
    mergelog()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ANCESTOR"))
        .stdout(predicate::str::contains("DESTINATION"))
        .stdout(predicate::str::contains("OTHER"));
}

#[test]
fn missing_operands_fail_with_usage() {
    mergelog()
        .args(["only", "two"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_option_fails_with_usage() {
    mergelog()
        .args(["--frobnicate", "o", "a", "b"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unreadable_input_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let a = write(dir.path(), "a", "x\n");
    let b = write(dir.path(), "b", "x\n");
    mergelog()
        .arg(dir.path().join("missing"))
        .arg(&a)
        .arg(&b)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("could not read file"));
    // The destination was not touched.
    assert_eq!(fs::read_to_string(&a).expect("read a"), "x\n");
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

#[test]
fn clean_merge_writes_destination_and_exits_zero() {
    let dir = TempDir::new().expect("tempdir");
    let ancestor = entry("2024-05-01", "shared history");
    let ours = [entry("2024-05-02", "our work"), ancestor.clone()].concat();
    let theirs = [entry("2024-05-03", "their work"), ancestor.clone()].concat();

    let o = write(dir.path(), "o", &ancestor);
    let a = write(dir.path(), "a", &ours);
    let b = write(dir.path(), "b", &theirs);

    // Upstream (the default): A is mainstream, B carries the user edits.
    mergelog().arg(&o).arg(&a).arg(&b).assert().success();

    let merged = fs::read_to_string(&a).expect("read merged");
    let expected = [
        entry("2024-05-03", "their work"),
        entry("2024-05-02", "our work"),
        ancestor,
    ]
    .concat();
    assert_eq!(merged, expected);
}

#[test]
fn downstream_env_swaps_the_sides() {
    let dir = TempDir::new().expect("tempdir");
    let ancestor = entry("2024-05-01", "shared history");
    let ours = [entry("2024-05-02", "our work"), ancestor.clone()].concat();
    let theirs = [entry("2024-05-03", "their work"), ancestor.clone()].concat();

    let o = write(dir.path(), "o", &ancestor);
    let a = write(dir.path(), "a", &ours);
    let b = write(dir.path(), "b", &theirs);

    mergelog()
        .env("GIT_DOWNSTREAM", "1")
        .arg(&o)
        .arg(&a)
        .arg(&b)
        .assert()
        .success();

    // Downstream: our entries stay on top.
    let merged = fs::read_to_string(&a).expect("read merged");
    let expected = [
        entry("2024-05-02", "our work"),
        entry("2024-05-03", "their work"),
        ancestor,
    ]
    .concat();
    assert_eq!(merged, expected);
}

#[test]
fn pull_reflog_action_means_downstream() {
    let dir = TempDir::new().expect("tempdir");
    let ancestor = entry("2024-05-01", "shared history");
    let ours = [entry("2024-05-02", "our work"), ancestor.clone()].concat();
    let theirs = [entry("2024-05-03", "their work"), ancestor.clone()].concat();

    let o = write(dir.path(), "o", &ancestor);
    let a = write(dir.path(), "a", &ours);
    let b = write(dir.path(), "b", &theirs);

    mergelog()
        .env("GIT_REFLOG_ACTION", "pull origin main")
        .arg(&o)
        .arg(&a)
        .arg(&b)
        .assert()
        .success();

    let merged = fs::read_to_string(&a).expect("read merged");
    assert!(merged.starts_with(&entry("2024-05-02", "our work")));
}

#[test]
fn conflicting_merge_exits_one_with_markers_on_top() {
    let dir = TempDir::new().expect("tempdir");
    let base = entry("2024-05-01", "an entry both sides will rewrite");
    let ours = entry("2024-05-01", "an entry both sides will rewrite, our way");
    let theirs = entry("2024-05-01", "an entry both sides will rewrite, their way");

    let o = write(dir.path(), "o", &base);
    let a = write(dir.path(), "a", &ours);
    let b = write(dir.path(), "b", &theirs);

    mergelog().arg(&o).arg(&a).arg(&b).assert().failure().code(1);

    let merged = fs::read_to_string(&a).expect("read merged");
    assert!(merged.starts_with("<<<<<<<\n"));
    assert!(merged.contains("=======\n"));
    assert!(merged.contains(">>>>>>>\n"));
    // The mainstream text follows the conflict block.
    assert!(merged.ends_with(&ours));
}

#[test]
fn split_merged_entry_flag_is_accepted() {
    let dir = TempDir::new().expect("tempdir");
    let f = entry("2024-05-01", "unchanged");
    let o = write(dir.path(), "o", &f);
    let a = write(dir.path(), "a", &f);
    let b = write(dir.path(), "b", &f);

    mergelog()
        .arg("--split-merged-entry")
        .arg(&o)
        .arg(&a)
        .arg(&b)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&a).expect("read merged"), f);
}

#[test]
fn empty_files_merge_to_an_empty_file() {
    let dir = TempDir::new().expect("tempdir");
    let o = write(dir.path(), "o", "");
    let a = write(dir.path(), "a", "");
    let b = write(dir.path(), "b", "");

    mergelog().arg(&o).arg(&a).arg(&b).assert().success();
    assert_eq!(fs::read_to_string(&a).expect("read merged"), "");
}

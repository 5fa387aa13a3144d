//! Run the built `notesgen` binary against temporary notes directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Path to the `notesgen` binary built by this Cargo workspace.
fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_notesgen"))
}

/// Run the binary in `cwd` with config loading disabled.
fn run(cwd: &Path, args: &[&str]) -> Output {
    Command::new(binary())
        .current_dir(cwd)
        .arg("-f")
        .args(args)
        .env_remove("NOTESGEN_LOG")
        .output()
        .unwrap_or_else(|e| panic!("cannot run {}: {e}", binary().display()))
}

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn single_file_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("notes.md"), "# Answer\n\n@6 * 7@\n");

    let out = run(dir.path(), &["notes.md"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("✓ Converted notes.md → notes.html"));

    let html = fs::read_to_string(dir.path().join("notes.html")).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h1>Answer</h1>\n<p>42</p>"));
}

#[test]
fn bare_output_to_named_file() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a.md"), "@'x' .. 'y'@");

    let out = run(dir.path(), &["-b", "a.md", "-o", "page.html"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read_to_string(dir.path().join("page.html")).unwrap(), "<p>xy</p>");
}

#[test]
fn directory_mirrored_into_output() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("docs/one.md"), "one");
    write(&dir.path().join("docs/deep/two.md"), "two");
    write(&dir.path().join("docs/skip.txt"), "no");

    let out = run(dir.path(), &["-rb", "docs", "-o", "dist"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read_to_string(dir.path().join("dist/one.html")).unwrap(), "<p>one</p>");
    assert_eq!(fs::read_to_string(dir.path().join("dist/deep/two.html")).unwrap(), "<p>two</p>");
    assert!(!dir.path().join("dist/skip.html").exists());
}

#[test]
fn directory_without_recursion_skips_subdirs() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("top.md"), "top");
    write(&dir.path().join("sub/inner.md"), "inner");

    let out = run(dir.path(), &[]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(dir.path().join("top.html").exists());
    assert!(!dir.path().join("sub/inner.html").exists());
}

#[test]
fn timeout_flag_bounds_snippets() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("loop.md"), "@@\nwhile true do end\n@@\n");

    let out = run(dir.path(), &["-b", "-t", "100", "loop.md"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let html = fs::read_to_string(dir.path().join("loop.html")).unwrap();
    assert!(html.contains("Script execution timed out after 100ms"));
}

#[test]
fn config_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a.md"), "a");
    write(&dir.path().join("site.rc"), "template = off\nextension = htm\n");

    let out = Command::new(binary())
        .current_dir(dir.path())
        .args(["-fsite.rc", "a.md"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read_to_string(dir.path().join("a.htm")).unwrap(), "<p>a</p>");
}

#[test]
fn local_config_is_found() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a.md"), "a");
    write(&dir.path().join(".notesgenrc"), "template = off\nbogus = 1\n");

    let out = Command::new(binary()).current_dir(dir.path()).arg("a.md").output().unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stderr(&out).contains("unknown setting 'bogus'"));
    assert_eq!(fs::read_to_string(dir.path().join("a.html")).unwrap(), "<p>a</p>");
}

#[test]
fn multiple_inputs_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a.md"), "a");
    write(&dir.path().join("b.md"), "b");

    let out = run(dir.path(), &["a.md", "b.md"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("notesgen: multiple input files"));
}

#[test]
fn missing_input_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["nope.md"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("invalid input path"));
}

#[test]
fn output_file_for_directory_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("docs/a.md"), "a");
    write(&dir.path().join("taken.html"), "");

    let out = run(dir.path(), &["docs", "-o", "taken.html"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("output path must be a directory"));
}

#[test]
fn bad_option_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["-z"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("unknown option: -z"));
    assert!(stderr(&out).contains("Usage: notesgen"));
}

#[test]
fn help_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["-h"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("--recursive"));
}

//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env_remove("SPELLREVIEW_ENDPOINT");
    cmd
}

const HELO_RESULT: &str =
    r#"{"success":true,"errors":true,"words":{"Helo":["Hello","Help"],"wrold":["world"]}}"#;

/// Write `text` and a canned check result into a fresh directory.
fn fixture(text: &str, result: &str) -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("input.txt");
    let result_path = tmp.path().join("result.json");
    fs::write(&input, text).unwrap();
    fs::write(&result_path, result).unwrap();
    (tmp, input, result_path)
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("SPELLREVIEW_ENDPOINT"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_only_prints_bare_version() {
    cmd()
        .arg("--version-only")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "{}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_outputs_valid_json() {
    let output = cmd().arg("info").arg("--json").assert().success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("info --json should output valid JSON");

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["config"]["boundary"].is_string());
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    cmd().args(["--quiet", "info"]).assert().success();
}

#[test]
fn multiple_verbose_flags_accepted() {
    cmd().args(["-vv", "info"]).assert().success();
}

#[test]
fn color_never_accepted() {
    cmd().args(["--color", "never", "info"]).assert().success();
}

#[test]
fn color_never_disables_ansi_in_info() {
    cmd()
        .args(["--color", "never", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b[").not());
}

#[test]
fn color_never_disables_ansi_in_scan() {
    let (_tmp, input, _result) = fixture("pre example, previous pre", "{}");

    cmd()
        .args(["--color", "never", "scan", path_str(&input), "pre"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b[").not())
        .stdout(predicate::str::contains("2 occurrences of pre"));
}

// =============================================================================
// Review Command
// =============================================================================

#[test]
fn review_accepting_suggestions_prints_corrected_text() {
    let (_tmp, input, result) = fixture("Helo wrold", HELO_RESULT);

    cmd()
        .args(["review", path_str(&input), "--result", path_str(&result)])
        .write_stdin("c\nc\n")
        .assert()
        .success()
        .stdout(predicate::str::diff("Hello world"))
        .stderr(predicate::str::contains("1) Hello  2) Help"))
        .stderr(predicate::str::contains("Spell check completed"));
}

#[test]
fn review_json_summary() {
    let (_tmp, input, result) = fixture("Helo wrold", HELO_RESULT);

    let output = cmd()
        .args([
            "review",
            path_str(&input),
            "--result",
            path_str(&result),
            "--json",
        ])
        .write_stdin("c 2\ni\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["notice"], "review_complete");
    assert_eq!(json["text"], "Help wrold");
    assert_eq!(json["changes"], 1);
    assert_eq!(json["ignored"], 1);
}

#[test]
fn review_in_place_rewrites_file() {
    let (_tmp, input, result) = fixture("Helo wrold\n", HELO_RESULT);

    cmd()
        .args([
            "review",
            path_str(&input),
            "--result",
            path_str(&result),
            "--in-place",
        ])
        .write_stdin("c\nc world\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(fs::read_to_string(&input).unwrap(), "Hello world\n");
}

#[test]
fn review_output_file() {
    let (tmp, input, result) = fixture("Helo wrold", HELO_RESULT);
    let out = tmp.path().join("out.txt");

    cmd()
        .args([
            "review",
            path_str(&input),
            "--result",
            path_str(&result),
            "--output",
            path_str(&out),
        ])
        .write_stdin("C\nI\n")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out).unwrap(), "Hello wrold");
    assert_eq!(fs::read_to_string(&input).unwrap(), "Helo wrold");
}

#[test]
fn review_end_of_input_keeps_changes() {
    let (_tmp, input, result) = fixture("Helo wrold", HELO_RESULT);

    cmd()
        .args(["review", path_str(&input), "--result", path_str(&result)])
        .write_stdin("c\n")
        .assert()
        .success()
        .stdout(predicate::str::diff("Hello wrold"))
        .stderr(predicate::str::contains("review closed"));
}

#[test]
fn review_undo_restores_text() {
    let (_tmp, input, result) = fixture("Helo wrold", HELO_RESULT);

    cmd()
        .args(["review", path_str(&input), "--result", path_str(&result)])
        .write_stdin("c\nu\ni\ni\n")
        .assert()
        .success()
        .stdout(predicate::str::diff("Helo wrold"));
}

#[test]
fn review_clean_text_reports_no_errors() {
    let (_tmp, input, result) = fixture("All good", r#"{"success":true,"errors":false,"words":[]}"#);

    cmd()
        .args(["review", path_str(&input), "--result", path_str(&result)])
        .assert()
        .success()
        .stdout(predicate::str::diff("All good"))
        .stderr(predicate::str::contains("No errors found."));
}

#[test]
fn review_trivial_text_skips_check() {
    let (_tmp, input, result) = fixture("a", HELO_RESULT);

    cmd()
        .args(["review", path_str(&input), "--result", path_str(&result)])
        .assert()
        .success()
        .stderr(predicate::str::contains("No errors found."));
}

#[test]
fn review_service_failure_exits_nonzero() {
    let (_tmp, input, result) = fixture("Helo wrold", r#"{"success":false}"#);

    cmd()
        .args(["review", path_str(&input), "--result", path_str(&result)])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "We have experienced an error and cannot complete the spell check.",
        ));
}

#[test]
fn review_malformed_result_exits_nonzero() {
    let (_tmp, input, result) = fixture("Helo wrold", "<html>502 Bad Gateway</html>");

    cmd()
        .args(["review", path_str(&input), "--result", path_str(&result)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot complete the spell check"));
}

#[test]
fn review_without_service_fails() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("input.txt");
    fs::write(&input, "Helo wrold").unwrap();

    cmd()
        .args(["-C", path_str(tmp.path()), "review", path_str(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no checking service configured"));
}

#[test]
fn review_rejects_bad_field() {
    let (_tmp, input, result) = fixture("Helo wrold", HELO_RESULT);

    cmd()
        .args([
            "review",
            path_str(&input),
            "--result",
            path_str(&result),
            "--field",
            "novalue",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn review_both_boundary_skips_word_tails() {
    let (_tmp, input, result) = fixture(
        "awrold wrold",
        r#"{"success":true,"errors":true,"words":{"wrold":["world"]}}"#,
    );

    cmd()
        .args([
            "review",
            path_str(&input),
            "--result",
            path_str(&result),
            "--boundary",
            "both",
        ])
        .write_stdin("C\n")
        .assert()
        .success()
        .stdout(predicate::str::diff("awrold world"))
        .stderr(predicate::str::contains("occurrence 1 of 1"));
}

// =============================================================================
// Scan Command
// =============================================================================

#[test]
fn scan_lists_whole_word_occurrences() {
    let (_tmp, input, _result) = fixture("pre example, previous pre", "{}");

    cmd()
        .args(["--color", "never", "scan", path_str(&input), "pre"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 occurrences of pre"))
        .stdout(predicate::str::contains(":22 #2"));
}

#[test]
fn scan_json_reports_offsets_and_context() {
    let (_tmp, input, _result) = fixture("Helo wrold", "{}");

    let output = cmd()
        .args(["scan", path_str(&input), "wrold", "--json", "--html"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["occurrences"][0]["start"], 5);
    assert_eq!(json["occurrences"][0]["context"]["before"], "Helo ");
    assert_eq!(
        json["occurrences"][0]["html"],
        "Helo <span class=\"word-highlight\">wrold</span>"
    );
}

#[test]
fn scan_without_matches_succeeds() {
    let (_tmp, input, _result) = fixture("previous", "{}");

    cmd()
        .args(["--color", "never", "scan", path_str(&input), "pre"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no occurrences of pre"));
}

// =============================================================================
// Replace Command
// =============================================================================

#[test]
fn replace_single_occurrence() {
    let (_tmp, input, _result) = fixture("cat cat cat", "{}");

    cmd()
        .args(["replace", path_str(&input), "cat", "dog", "--occurrence", "2"])
        .assert()
        .success()
        .stdout(predicate::str::diff("cat dog cat"));
}

#[test]
fn replace_all_in_place() {
    let (_tmp, input, _result) = fixture("cat catalog cat", "{}");

    cmd()
        .args(["replace", path_str(&input), "cat", "dog", "--all", "--in-place"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(fs::read_to_string(&input).unwrap(), "dog catalog dog");
}

#[test]
fn replace_missing_occurrence_fails() {
    let (_tmp, input, _result) = fixture("cat cat", "{}");

    cmd()
        .args(["replace", path_str(&input), "cat", "dog", "--occurrence", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("occurrence 3 of `cat` not found"));
}

#[test]
fn replace_requires_target() {
    let (_tmp, input, _result) = fixture("cat", "{}");

    cmd()
        .args(["replace", path_str(&input), "cat", "dog"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn replace_rejects_occurrence_zero() {
    let (_tmp, input, _result) = fixture("cat", "{}");

    cmd()
        .args(["replace", path_str(&input), "cat", "dog", "--occurrence", "0"])
        .assert()
        .failure();
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    // arg_required_else_help makes clap print help to stderr and exit 2
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn missing_input_file_fails() {
    cmd()
        .args(["scan", "/nonexistent/input.txt", "word"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn oversized_input_is_rejected() {
    let (tmp, input, _result) = fixture("cat cat cat", "{}");
    fs::write(tmp.path().join(".spellreview.toml"), "max_input_bytes = 4\n").unwrap();

    cmd()
        .args([
            "-C",
            path_str(tmp.path()),
            "replace",
            path_str(&input),
            "cat",
            "dog",
            "--all",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input too large"));
}

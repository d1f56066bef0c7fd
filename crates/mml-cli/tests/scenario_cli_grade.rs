//! End-to-end `mml grade` against mock tools.
#![cfg(unix)]

mod common;

use common::Lab;
use predicates::prelude::*;

#[test]
fn perfect_lab_scores_ninety() {
    let lab = Lab::passing("60.00", 1000);
    lab.trace("short1.rep", 1400);
    lab.trace("short2.rep", 1400);
    lab.trace("notes.txt", 1);

    lab.mml()
        .arg("--skip-build")
        .assert()
        .success()
        .stdout(predicate::str::contains("./traces/short1.rep"))
        .stdout(predicate::str::contains("./traces/short2.rep"))
        .stdout(predicate::str::contains("notes.txt").not())
        .stdout(predicate::str::contains(
            "Correct: 20.00/20, perf: 20.00/20, util: 50.00/50",
        ))
        .stdout(predicate::str::contains("Score 90 / 90"));
}

#[test]
fn grade_subcommand_matches_default() {
    let lab = Lab::passing("60.00", 1000);
    lab.trace("a.rep", 1400);

    lab.mml()
        .args(["grade", "--skip-build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score 90 / 90"));
}

#[test]
fn failed_correctness_still_exits_zero() {
    let lab = Lab::failing();
    lab.trace("a.rep", 1400);

    lab.mml()
        .arg("--skip-build")
        .assert()
        .success()
        .stdout(predicate::str::contains("No"))
        .stdout(predicate::str::contains("-1"))
        .stdout(predicate::str::contains("Score 0 / 90"));
}

#[test]
fn low_utilization_prints_notice() {
    let lab = Lab::passing("30.00", 1000);
    lab.trace("a.rep", 1400);

    lab.mml()
        .arg("--skip-build")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Your utilization was 25.00, which is below the minimum of 35",
        ))
        .stdout(predicate::str::contains("Score 40 / 90"));
}

#[test]
fn empty_traces_dir_reports_zero() {
    let lab = Lab::passing("60.00", 1000);

    lab.mml()
        .arg("--skip-build")
        .assert()
        .success()
        .stdout(predicate::str::contains("No traces found"))
        .stdout(predicate::str::contains("Score 0 / 90"));
}

#[test]
fn missing_traces_dir_is_an_error() {
    let lab = Lab::passing("60.00", 1000);

    lab.mml()
        .args(["--skip-build", "--traces-dir", "./nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn missing_checker_is_an_error() {
    let lab = Lab::empty();
    lab.trace("a.rep", 1400);

    lab.mml()
        .arg("--skip-build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("runner"));
}

#[test]
fn json_format_emits_grade_report() {
    let lab = Lab::passing("60.00", 1000);
    lab.trace("a.rep", 1400);

    let out = lab
        .mml()
        .args(["--skip-build", "--format", "json"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["breakdown"]["total"], 90);
    assert_eq!(v["max_total"], 90);
    assert_eq!(v["report"]["rows"][0]["operation_count"], 1400);
    assert_eq!(v["report"]["rows"][0]["utilization"]["status"], "measured");
}

#[test]
fn export_dir_gets_manifest_and_report() {
    let lab = Lab::passing("60.00", 1000);
    lab.trace("a.rep", 1400);

    lab.mml()
        .args(["--skip-build", "--export-dir", "./exports"])
        .assert()
        .success()
        .stderr(predicate::str::contains("export_dir="));

    let runs: Vec<_> = std::fs::read_dir(lab.path().join("exports"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].join("manifest.json").is_file());

    let report = std::fs::read_to_string(runs[0].join("grade_report.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(v["breakdown"]["total"], 90);
}

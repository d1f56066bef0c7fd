//! A trace that fails correctness is never probed for utilization or
//! performance, and its row carries both as failed.

use mml_config::HarnessConfig;
use mml_eval::{evaluate_all, TraceEvaluator};
use mml_probe::{ProbeFailure, ProbeResult, ProbeSettings};
use mml_testkit::{
    checker_output, completed, exit_with, perf_output, trace, ScriptedRunner, TraceDir,
};

fn settings() -> ProbeSettings {
    ProbeSettings::from_config(&HarnessConfig::default())
}

fn passing_runner() -> ScriptedRunner {
    ScriptedRunner::new()
        .on("runner", &["-r"], completed(&checker_output(72.0)))
        .on("runner", &["-ru"], completed(&checker_output(72.0)))
        .on("performance", &[], completed(&perf_output(1000)))
}

#[tokio::test]
async fn failing_correctness_skips_other_probes() {
    let runner = ScriptedRunner::new()
        .on("runner", &["-r"], exit_with(1, "umalloc package failed.\n"))
        .on("runner", &["-ru"], completed(&checker_output(72.0)))
        .on("performance", &[], completed(&perf_output(1000)));
    let s = settings();

    let row = TraceEvaluator::new(&runner, &s)
        .evaluate(&trace("bad.rep", 100))
        .await
        .unwrap();

    assert!(!row.correctness_passed);
    assert_eq!(row.utilization, ProbeResult::Failed(ProbeFailure::NotProbed));
    assert_eq!(row.performance, ProbeResult::Failed(ProbeFailure::NotProbed));
    assert_eq!(runner.count("runner", &["-ru"]), 0);
    assert_eq!(runner.count("performance", &[]), 0);
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn passing_trace_runs_correctness_then_utilization_then_performance() {
    let runner = passing_runner();
    let s = settings();

    let row = TraceEvaluator::new(&runner, &s)
        .evaluate(&trace("ok.rep", 1400))
        .await
        .unwrap();

    assert!(row.correctness_passed);
    assert_eq!(row.utilization, ProbeResult::Measured(72.0));
    assert_eq!(row.performance, ProbeResult::Measured(1400.0));
    assert_eq!(row.operation_count, Some(1400));

    let calls: Vec<String> = runner.calls().iter().map(|c| c.to_string()).collect();
    assert_eq!(calls[0], "./runner -r ./traces/ok.rep");
    assert_eq!(calls[1], "./runner -ru ./traces/ok.rep");
    assert!(calls[2..]
        .iter()
        .all(|c| c == "./performance ./traces/ok.rep"));
    assert_eq!(calls.len(), 22);
}

#[tokio::test]
async fn probe_failures_after_a_pass_are_recorded_not_raised() {
    let runner = ScriptedRunner::new()
        .on("runner", &["-r"], completed(&checker_output(72.0)))
        .on("runner", &["-ru"], exit_with(1, ""))
        .on("performance", &[], completed("Bus error\n"));
    let s = settings();

    let row = TraceEvaluator::new(&runner, &s)
        .evaluate(&trace("flaky.rep", 10))
        .await
        .unwrap();

    assert!(row.correctness_passed);
    assert!(!row.utilization.is_measured());
    assert_eq!(row.performance, ProbeResult::Failed(ProbeFailure::MissingMarker));
}

#[tokio::test]
async fn every_failed_row_in_a_run_was_never_probed() {
    let dir = TraceDir::new();
    dir.add("a.rep", 10);
    dir.add("b.rep", 10);
    dir.add("c.rep", 10);
    let files = vec![dir.file("a.rep"), dir.file("b.rep"), dir.file("c.rep")];

    // Correctness alternates fail / pass / fail.
    let runner = ScriptedRunner::new()
        .on_sequence(
            "runner",
            &["-r"],
            vec![
                exit_with(1, ""),
                completed(&checker_output(50.0)),
                completed("no marker here\n"),
            ],
        )
        .on("runner", &["-ru"], completed(&checker_output(50.0)))
        .on("performance", &[], completed(&perf_output(100)));

    let report = evaluate_all(&runner, &settings(), &files).await.unwrap();

    assert_eq!(report.len(), 3);
    let passed: Vec<bool> = report.rows().iter().map(|r| r.correctness_passed).collect();
    assert_eq!(passed, vec![false, true, false]);
    for row in report.rows().iter().filter(|r| !r.correctness_passed) {
        assert!(!row.utilization.is_measured());
        assert!(!row.performance.is_measured());
    }
    assert_eq!(runner.count("runner", &["-ru"]), 1);
    assert_eq!(runner.count("performance", &[]), 20);
}

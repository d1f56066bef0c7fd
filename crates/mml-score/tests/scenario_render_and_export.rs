//! Text rendering and the JSON grade report.

use mml_eval::{Report, TraceResult};
use mml_probe::{ProbeFailure, ProbeResult};
use mml_score::{grade, render_json, render_text, write_grade_report_json, GradeReport};
use mml_testkit::trace;

fn mixed_report() -> Report {
    vec![
        TraceResult::passed(
            &trace("short1.rep", 1400),
            ProbeResult::Measured(60.0),
            ProbeResult::Measured(1400.0),
        ),
        TraceResult::failed_correctness(&trace("short2.rep", 12)),
        TraceResult::passed(
            &trace("short3.rep", 12),
            ProbeResult::Measured(58.5),
            ProbeResult::Failed(ProbeFailure::TimedOut { after_secs: 60 }),
        ),
    ]
    .into_iter()
    .collect()
}

#[test]
fn table_lists_rows_in_order_with_sentinels() {
    let text = render_text(&grade(mixed_report()));
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("Trace"));
    assert!(lines[0].contains("Performance (Operations per millisecond)"));
    assert!(lines[1].starts_with("-----"));

    assert!(lines[2].starts_with("./traces/short1.rep"));
    assert!(lines[2].contains("Yes"));
    assert!(lines[2].contains("60.00"));
    assert!(lines[2].contains("1400.00"));

    assert!(lines[3].starts_with("./traces/short2.rep"));
    assert!(lines[3].contains("No"));
    assert!(lines[3].trim_end().ends_with("-1"));

    assert!(lines[4].contains("58.50"));
    assert!(lines[4].trim_end().ends_with("-1"));

    // 2 of 3 passed
    assert!(lines[5].starts_with("Average"));
    assert!(lines[5].contains("66.67"));
}

#[test]
fn score_lines_close_the_output() {
    let text = render_text(&grade(
        std::iter::once(TraceResult::passed(
            &trace("t.rep", 1400),
            ProbeResult::Measured(60.0),
            ProbeResult::Measured(1400.0),
        ))
        .collect(),
    ));

    assert!(text.contains("Correct: 20.00/20, perf: 20.00/20, util: 50.00/50"));
    assert!(text.contains("Score 90 / 90"));
    assert!(text
        .trim_end()
        .ends_with("The other ten points come from the style check, after the assignment is turned in"));
    assert!(!text.contains("below the minimum"));
}

#[test]
fn low_utilization_prints_notice() {
    let text = render_text(&grade(
        std::iter::once(TraceResult::passed(
            &trace("t.rep", 1400),
            ProbeResult::Measured(30.0),
            ProbeResult::Measured(1400.0),
        ))
        .collect(),
    ));

    assert!(text.contains(
        "Your utilization was 25.00, which is below the minimum of 35 required to receive utilization credit."
    ));
}

#[test]
fn empty_report_says_so() {
    let text = render_text(&grade(Report::new()));
    assert!(text.starts_with("No traces found\n"));
    assert!(text.contains("Score 0 / 90"));
}

#[test]
fn grade_report_json_is_written_and_reloads() {
    let g = grade(mixed_report());
    let dir = tempfile::tempdir().unwrap();

    let path = write_grade_report_json(dir.path(), &g).unwrap();
    assert_eq!(path, dir.path().join("grade_report.json"));

    let text = std::fs::read_to_string(&path).unwrap();
    let back: GradeReport = serde_json::from_str(&text).unwrap();
    assert_eq!(back.report, g.report);
    assert_eq!(back.breakdown.total, g.breakdown.total);

    let v: serde_json::Value = serde_json::from_str(&render_json(&g).unwrap()).unwrap();
    assert_eq!(v["max_total"], 90);
    assert_eq!(v["breakdown"]["scale_factor"], 0);
    assert_eq!(v["report"]["rows"][2]["performance"]["value"]["kind"], "timed_out");
}

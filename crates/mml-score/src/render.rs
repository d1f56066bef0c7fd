use std::fmt::Write as _;

use mml_probe::ProbeResult;

use crate::types::{GradeReport, UTILIZATION_FLOOR};

const HEADERS: [&str; 4] = [
    "Trace",
    "Passed",
    "Utilization",
    "Performance (Operations per millisecond)",
];

const STYLE_NOTE: &str =
    "The other ten points come from the style check, after the assignment is turned in";

/// Human-readable table + score lines. Pure formatting.
pub fn render_text(grade: &GradeReport) -> String {
    let mut out = String::new();

    if grade.report.is_empty() {
        out.push_str("No traces found\n");
    }

    let mut rows: Vec<[String; 4]> = grade
        .report
        .rows()
        .iter()
        .map(|row| {
            [
                row.trace.display().to_string(),
                if row.correctness_passed { "Yes" } else { "No" }.to_string(),
                cell(&row.utilization),
                cell(&row.performance),
            ]
        })
        .collect();

    let avg = &grade.averages;
    rows.push([
        "Average".to_string(),
        format!("{:.2}", avg.correctness * 100.0),
        format!("{:.2}", avg.utilization),
        format!("{:.2}", avg.performance),
    ]);

    write_table(&mut out, &rows);

    let b = &grade.breakdown;
    if b.utilization_below_floor() {
        let _ = writeln!(
            out,
            "Your utilization was {:.2}, which is below the minimum of {} required to receive utilization credit.",
            b.raw_utilization_score, UTILIZATION_FLOOR
        );
    }
    let _ = writeln!(
        out,
        "Correct: {:.2}/20, perf: {:.2}/20, util: {:.2}/50",
        b.correctness_score, b.performance_score, b.utilization_score
    );
    let _ = writeln!(out, "Score {} / {}", b.total, grade.max_total);
    let _ = writeln!(out, "{STYLE_NOTE}");
    out
}

/// Pretty JSON of the full grade report.
pub fn render_json(grade: &GradeReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(grade)
}

fn cell(result: &ProbeResult<f64>) -> String {
    match result.measured() {
        Some(v) => format!("{v:.2}"),
        None => "-1".to_string(),
    }
}

fn write_table(out: &mut String, rows: &[[String; 4]]) {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (w, c) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(c.len());
        }
    }

    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect();
    let _ = writeln!(out, "{}", header.join("  ").trim_end());

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));

    for row in rows {
        // First column left-aligned, the rest right-aligned.
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (c, w))| {
                if i == 0 {
                    format!("{c:<w$}")
                } else {
                    format!("{c:>w$}")
                }
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join("  ").trim_end());
    }
}

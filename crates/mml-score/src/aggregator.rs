use mml_eval::Report;

use crate::types::{
    Averages, GradeReport, ScoreBreakdown, CORRECTNESS_WEIGHT, HARNESS_MAX_TOTAL,
    PERFORMANCE_CAP, PERFORMANCE_TARGET, PERFORMANCE_WEIGHT, UTILIZATION_CAP, UTILIZATION_FLOOR,
    UTILIZATION_TARGET, UTILIZATION_WEIGHT,
};

// ============================================================================
// Public API
// ============================================================================

/// Reduce the report rows to cross-trace averages.
pub fn compute_averages(report: &Report) -> Averages {
    let rows = report.rows();
    let attempted = rows.len();
    let passed = rows.iter().filter(|r| r.correctness_passed).count();

    let utilization: Vec<f64> = rows.iter().filter_map(|r| r.utilization.measured()).collect();
    let performance: Vec<f64> = rows.iter().filter_map(|r| r.performance.measured()).collect();

    Averages {
        attempted,
        passed,
        utilization_samples: utilization.len(),
        performance_samples: performance.len(),
        correctness: ratio(passed as f64, attempted),
        utilization: ratio(utilization.iter().sum(), utilization.len()),
        performance: ratio(performance.iter().sum(), performance.len()),
    }
}

/// Apply the composite formula.
///
/// ```text
/// util  = 50 * avg_util / 60     ; < 35 -> 0 ; > 55 -> 55
/// perf  = 20 * avg_perf / 1400   ; > 25 -> 25
/// corr  = 20 * avg_correctness
/// total = ceil(corr + (perf + util) * scale)   scale = 1 iff all traces passed
/// ```
pub fn score(averages: &Averages) -> ScoreBreakdown {
    let raw_utilization_score = UTILIZATION_WEIGHT * (averages.utilization / UTILIZATION_TARGET);
    let utilization_score = if raw_utilization_score < UTILIZATION_FLOOR {
        0.0
    } else {
        raw_utilization_score.min(UTILIZATION_CAP)
    };

    let performance_score =
        (PERFORMANCE_WEIGHT * (averages.performance / PERFORMANCE_TARGET)).min(PERFORMANCE_CAP);

    let correctness_score = CORRECTNESS_WEIGHT * averages.correctness;

    let scale_factor: u8 = if averages.fully_correct() { 1 } else { 0 };

    let total = correctness_score + (performance_score + utilization_score) * f64::from(scale_factor);

    ScoreBreakdown {
        correctness_score,
        performance_score,
        utilization_score,
        raw_utilization_score,
        scale_factor,
        total: total.ceil().max(0.0) as u32,
    }
}

/// Averages + breakdown, bundled with the rows they came from.
pub fn grade(report: Report) -> GradeReport {
    let averages = compute_averages(&report);
    let breakdown = score(&averages);
    GradeReport {
        report,
        averages,
        breakdown,
        max_total: HARNESS_MAX_TOTAL,
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// `sum / count`, or 0 when there is nothing to average.
fn ratio(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

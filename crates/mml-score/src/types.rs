use std::io;
use std::path::{Path, PathBuf};

use mml_eval::Report;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Policy constants (not configurable)
// ---------------------------------------------------------------------------

/// Utilization percentage that earns the full weight.
pub const UTILIZATION_TARGET: f64 = 60.0;
/// Throughput (ops/ms) that earns the full weight.
pub const PERFORMANCE_TARGET: f64 = 1400.0;

pub const UTILIZATION_WEIGHT: f64 = 50.0;
pub const PERFORMANCE_WEIGHT: f64 = 20.0;
pub const CORRECTNESS_WEIGHT: f64 = 20.0;

/// Utilization scores below this earn nothing.
pub const UTILIZATION_FLOOR: f64 = 35.0;
pub const UTILIZATION_CAP: f64 = 55.0;
pub const PERFORMANCE_CAP: f64 = 25.0;

/// Points this harness grades; the rest of the scale (style) is assessed
/// elsewhere.
pub const HARNESS_MAX_TOTAL: u32 = 90;

// ---------------------------------------------------------------------------
// Averages
// ---------------------------------------------------------------------------

/// Cross-trace averages. Any average over zero samples is `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    /// Traces attempted (every row, malformed headers included).
    pub attempted: usize,
    pub passed: usize,
    pub utilization_samples: usize,
    pub performance_samples: usize,
    /// `passed / attempted`.
    pub correctness: f64,
    /// Mean over measured utilization values only.
    pub utilization: f64,
    /// Mean over measured throughput values only.
    pub performance: f64,
}

impl Averages {
    /// Every attempted trace passed (and there was at least one).
    pub fn fully_correct(&self) -> bool {
        self.attempted > 0 && self.passed == self.attempted
    }
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub correctness_score: f64,
    pub performance_score: f64,
    /// After floor and cap.
    pub utilization_score: f64,
    /// `50 * avg / target`, before floor and cap.
    pub raw_utilization_score: f64,
    /// 1 when every trace passed correctness, else 0.
    pub scale_factor: u8,
    pub total: u32,
}

impl ScoreBreakdown {
    /// True when the raw utilization score is under the floor, including a
    /// raw score of 0 (no utilization measured at all).
    pub fn utilization_below_floor(&self) -> bool {
        self.raw_utilization_score < UTILIZATION_FLOOR
    }
}

// ---------------------------------------------------------------------------
// Report artifact
// ---------------------------------------------------------------------------

/// Everything a grading run produced (serializable to JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub report: Report,
    pub averages: Averages,
    pub breakdown: ScoreBreakdown,
    pub max_total: u32,
}

/// Write the report as pretty-printed JSON to `out_dir/grade_report.json`.
/// Returns the path written.
pub fn write_grade_report_json(out_dir: &Path, report: &GradeReport) -> io::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join("grade_report.json");
    let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
    std::fs::write(&path, format!("{json}\n"))?;
    Ok(path)
}

//! mml-score
//!
//! Cross-trace averages, the composite score, and its presentation.
//!
//! - Averages over zero samples are 0; nothing here divides by zero.
//! - Non-correctness credit is gated on every trace passing.
//! - The renderer makes no decisions.

mod aggregator;
mod render;
mod types;

pub use aggregator::{compute_averages, grade, score};
pub use render::{render_json, render_text};
pub use types::{
    write_grade_report_json, Averages, GradeReport, ScoreBreakdown, CORRECTNESS_WEIGHT,
    HARNESS_MAX_TOTAL, PERFORMANCE_CAP, PERFORMANCE_TARGET, PERFORMANCE_WEIGHT,
    UTILIZATION_CAP, UTILIZATION_FLOOR, UTILIZATION_TARGET, UTILIZATION_WEIGHT,
};

use std::path::PathBuf;

use mml_probe::ProbeResult;
use mml_trace::Trace;
use serde::{Deserialize, Serialize};

/// One row of the evaluation.
///
/// When `correctness_passed` is false both `utilization` and `performance`
/// are `Failed`; the constructors below are the only way this crate builds
/// rows, and they keep it that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceResult {
    pub trace: PathBuf,
    /// `None` when the header could not be read.
    pub operation_count: Option<u64>,
    pub correctness_passed: bool,
    pub utilization: ProbeResult<f64>,
    pub performance: ProbeResult<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_error: Option<String>,
}

impl TraceResult {
    /// Correctness passed; both measurements were attempted.
    pub fn passed(trace: &Trace, utilization: ProbeResult<f64>, performance: ProbeResult<f64>) -> Self {
        Self {
            trace: trace.path.clone(),
            operation_count: Some(trace.operation_count),
            correctness_passed: true,
            utilization,
            performance,
            header_error: None,
        }
    }

    /// Correctness failed; nothing else was probed.
    pub fn failed_correctness(trace: &Trace) -> Self {
        Self {
            trace: trace.path.clone(),
            operation_count: Some(trace.operation_count),
            correctness_passed: false,
            utilization: ProbeResult::not_probed(),
            performance: ProbeResult::not_probed(),
            header_error: None,
        }
    }

    /// Header unreadable; no tool was invoked.
    pub fn malformed(path: PathBuf, error: String) -> Self {
        Self {
            trace: path,
            operation_count: None,
            correctness_passed: false,
            utilization: ProbeResult::not_probed(),
            performance: ProbeResult::not_probed(),
            header_error: Some(error),
        }
    }
}

/// Ordered evaluation rows (discovery order). Append-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    rows: Vec<TraceResult>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: TraceResult) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[TraceResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<TraceResult> for Report {
    fn from_iter<I: IntoIterator<Item = TraceResult>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

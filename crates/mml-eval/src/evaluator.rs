use mml_probe::{
    check_correctness, measure_performance, measure_utilization, ProbeSettings, ProcessError,
    ToolRunner,
};
use mml_trace::{Trace, TraceFile};
use tracing::{info, warn};

use crate::report::{Report, TraceResult};

/// Runs the probes for one trace under the correctness gate.
pub struct TraceEvaluator<'a, R: ToolRunner + ?Sized> {
    runner: &'a R,
    settings: &'a ProbeSettings,
}

impl<'a, R: ToolRunner + ?Sized> TraceEvaluator<'a, R> {
    pub fn new(runner: &'a R, settings: &'a ProbeSettings) -> Self {
        Self { runner, settings }
    }

    /// Read the header, then evaluate. A bad header yields a failed row
    /// without invoking any tool.
    pub async fn evaluate_file(&self, file: &TraceFile) -> Result<TraceResult, ProcessError> {
        match Trace::load(file) {
            Ok(trace) => self.evaluate(&trace).await,
            Err(e) => {
                warn!(trace = %file, error = %e, "malformed trace header; recorded as failed");
                Ok(TraceResult::malformed(file.path.clone(), e.to_string()))
            }
        }
    }

    pub async fn evaluate(&self, trace: &Trace) -> Result<TraceResult, ProcessError> {
        if !check_correctness(self.runner, self.settings, trace).await? {
            return Ok(TraceResult::failed_correctness(trace));
        }
        let utilization = measure_utilization(self.runner, self.settings, trace).await?;
        let performance = measure_performance(self.runner, self.settings, trace).await?;
        Ok(TraceResult::passed(trace, utilization, performance))
    }
}

/// Evaluate `traces` in order and return the finished report.
///
/// Only [`ProcessError`] aborts the run.
pub async fn evaluate_all<R: ToolRunner + ?Sized>(
    runner: &R,
    settings: &ProbeSettings,
    traces: &[TraceFile],
) -> Result<Report, ProcessError> {
    let evaluator = TraceEvaluator::new(runner, settings);
    let mut report = Report::new();
    for (i, file) in traces.iter().enumerate() {
        info!(trace = %file, index = i + 1, total = traces.len(), "evaluating");
        report.push(evaluator.evaluate_file(file).await?);
    }
    Ok(report)
}

use mml_trace::Trace;
use tracing::{debug, info, warn};

use crate::parse::parse_elapsed;
use crate::process::{ProcessError, ToolOutput, ToolRunner};
use crate::result::{ProbeFailure, ProbeResult};
use crate::settings::ProbeSettings;

/// Throughput in operations per millisecond, averaged over
/// `settings.performance_runs` trials.
///
/// All-or-nothing: the first trial that times out, lacks the marker or
/// prints an unreadable time aborts the probe. No subset is ever averaged.
pub async fn measure_performance<R: ToolRunner + ?Sized>(
    runner: &R,
    settings: &ProbeSettings,
    trace: &Trace,
) -> Result<ProbeResult<f64>, ProcessError> {
    let runs = settings.performance_runs.max(1);
    let inv = settings.performance_invocation(trace);

    let mut total_elapsed: u64 = 0;
    for run in 0..runs {
        let out = match runner.run(&inv).await? {
            ToolOutput::Completed(out) => out,
            ToolOutput::TimedOut { after } => {
                warn!(trace = %trace, run, "performance: trial timed out");
                return Ok(ProbeResult::Failed(ProbeFailure::TimedOut {
                    after_secs: after.as_secs(),
                }));
            }
        };
        if !out.stdout.contains(&settings.performance_marker) {
            warn!(trace = %trace, run, "performance: marker missing");
            return Ok(ProbeResult::Failed(ProbeFailure::MissingMarker));
        }
        let elapsed = match parse_elapsed(&out.stdout) {
            Ok(t) => t,
            Err(e) => {
                warn!(trace = %trace, run, error = %e, "performance: malformed output");
                return Ok(ProbeResult::Failed(ProbeFailure::MalformedOutput {
                    detail: e.to_string(),
                }));
            }
        };
        debug!(trace = %trace, run, elapsed, "performance trial");
        total_elapsed = total_elapsed.saturating_add(elapsed);
    }

    let result = throughput(trace.operation_count, total_elapsed, runs);
    if let ProbeResult::Measured(ops_per_ms) = result {
        info!(trace = %trace, ops_per_ms, "performance");
    } else {
        warn!(trace = %trace, total_elapsed, "performance: zero mean elapsed time");
    }
    Ok(result)
}

/// `operation_count / (total_elapsed / runs) * 1000`, with the mean taken by
/// integer floor division (the tool reports whole microseconds).
pub(crate) fn throughput(operation_count: u64, total_elapsed: u64, runs: u32) -> ProbeResult<f64> {
    let mean = total_elapsed / u64::from(runs.max(1));
    if mean == 0 {
        return ProbeResult::Failed(ProbeFailure::ZeroElapsed);
    }
    ProbeResult::Measured(operation_count as f64 / mean as f64 * 1000.0)
}

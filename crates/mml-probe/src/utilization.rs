use mml_trace::Trace;
use tracing::{info, warn};

use crate::parse::parse_utilization;
use crate::process::{ProcessError, ToolOutput, ToolRunner};
use crate::result::{ProbeFailure, ProbeResult};
use crate::settings::ProbeSettings;

/// Heap utilization percentage reported by the checker.
pub async fn measure_utilization<R: ToolRunner + ?Sized>(
    runner: &R,
    settings: &ProbeSettings,
    trace: &Trace,
) -> Result<ProbeResult<f64>, ProcessError> {
    let inv = settings.utilization_invocation(trace);
    let result = match runner.run(&inv).await? {
        ToolOutput::Completed(out) if !out.success => ProbeResult::Failed(ProbeFailure::NonZeroExit {
            code: out.exit_code,
        }),
        ToolOutput::Completed(out) => match parse_utilization(&out.stdout) {
            Ok(pct) => ProbeResult::Measured(pct),
            Err(e) => ProbeResult::Failed(ProbeFailure::MalformedOutput {
                detail: e.to_string(),
            }),
        },
        ToolOutput::TimedOut { after } => ProbeResult::Failed(ProbeFailure::TimedOut {
            after_secs: after.as_secs(),
        }),
    };

    match &result {
        ProbeResult::Measured(pct) => info!(trace = %trace, utilization = pct, "utilization"),
        ProbeResult::Failed(why) => warn!(trace = %trace, %why, "utilization failed"),
    }
    Ok(result)
}

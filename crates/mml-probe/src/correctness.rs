use mml_trace::Trace;
use tracing::{info, warn};

use crate::process::{ProcessError, ToolOutput, ToolRunner};
use crate::settings::ProbeSettings;

/// Pass iff the checker exits 0 AND prints the correctness marker.
///
/// Every other outcome, timeout included, is a plain `false`.
pub async fn check_correctness<R: ToolRunner + ?Sized>(
    runner: &R,
    settings: &ProbeSettings,
    trace: &Trace,
) -> Result<bool, ProcessError> {
    let inv = settings.correctness_invocation(trace);
    let passed = match runner.run(&inv).await? {
        ToolOutput::Completed(out) => {
            if !out.success {
                warn!(trace = %trace, code = ?out.exit_code, "correctness: checker failed");
                false
            } else if !out.stdout.contains(&settings.correctness_marker) {
                warn!(trace = %trace, "correctness: marker missing");
                false
            } else {
                true
            }
        }
        ToolOutput::TimedOut { after } => {
            warn!(trace = %trace, after_secs = after.as_secs(), "correctness: timed out");
            false
        }
    };
    info!(trace = %trace, passed, "correctness");
    Ok(passed)
}

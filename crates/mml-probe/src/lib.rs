//! mml-probe
//!
//! Everything that touches the external allocator tools:
//!
//! - [`process`]: bounded, always-reaped subprocess execution behind the
//!   [`ToolRunner`] seam
//! - [`parse`]: the fixed positional output contract of the tools
//! - the three per-trace probes (correctness, utilization, performance)
//! - [`build`]: the clean rebuild that precedes a grading run
//!
//! Probe failures (bad exit, missing marker, malformed output, timeout) are
//! values, not errors. Only [`ProcessError`] propagates.

pub mod build;
mod correctness;
pub mod parse;
mod performance;
pub mod process;
mod result;
mod settings;
mod utilization;

pub use build::{rebuild, BuildError};
pub use correctness::check_correctness;
pub use parse::MalformedOutputError;
pub use performance::measure_performance;
pub use process::{CapturedOutput, Invocation, ProcessError, ProcessRunner, ToolOutput, ToolRunner};
pub use result::{ProbeFailure, ProbeResult};
pub use settings::ProbeSettings;
pub use utilization::measure_utilization;

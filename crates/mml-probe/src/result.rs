use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a probe produced no measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// Correctness did not pass, so the probe was never invoked.
    NotProbed,
    NonZeroExit { code: Option<i32> },
    MissingMarker,
    MalformedOutput { detail: String },
    TimedOut { after_secs: u64 },
    /// Mean elapsed time was zero; throughput is undefined.
    ZeroElapsed,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::NotProbed => write!(f, "not probed"),
            ProbeFailure::NonZeroExit { code: Some(c) } => write!(f, "exit status {c}"),
            ProbeFailure::NonZeroExit { code: None } => write!(f, "killed by signal"),
            ProbeFailure::MissingMarker => write!(f, "success marker missing"),
            ProbeFailure::MalformedOutput { detail } => write!(f, "malformed output: {detail}"),
            ProbeFailure::TimedOut { after_secs } => write!(f, "timed out after {after_secs}s"),
            ProbeFailure::ZeroElapsed => write!(f, "zero elapsed time"),
        }
    }
}

/// Measured value or a failure sentinel. A genuine `0.0` measurement is
/// `Measured(0.0)`, never `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ProbeResult<T> {
    Measured(T),
    Failed(ProbeFailure),
}

impl<T: Copy> ProbeResult<T> {
    pub fn measured(&self) -> Option<T> {
        match self {
            ProbeResult::Measured(v) => Some(*v),
            ProbeResult::Failed(_) => None,
        }
    }
}

impl<T> ProbeResult<T> {
    pub fn not_probed() -> Self {
        ProbeResult::Failed(ProbeFailure::NotProbed)
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, ProbeResult::Measured(_))
    }

    pub fn failure(&self) -> Option<&ProbeFailure> {
        match self {
            ProbeResult::Measured(_) => None,
            ProbeResult::Failed(f) => Some(f),
        }
    }
}

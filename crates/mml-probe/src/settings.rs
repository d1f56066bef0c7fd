use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mml_config::HarnessConfig;
use mml_trace::Trace;

use crate::process::Invocation;

/// Resolved, ready-to-invoke view of the tool section of [`HarnessConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub checker: PathBuf,
    pub performance: PathBuf,
    pub workdir: Option<PathBuf>,
    pub correctness_args: Vec<String>,
    pub utilization_args: Vec<String>,
    pub correctness_marker: String,
    pub performance_marker: String,
    pub timeout: Duration,
    /// Timed trials per trace (N).
    pub performance_runs: u32,
}

impl ProbeSettings {
    pub fn from_config(cfg: &HarnessConfig) -> Self {
        let workdir = cfg.tools.workdir.clone();
        Self {
            checker: resolve_program(workdir.as_deref(), &cfg.tools.checker),
            performance: resolve_program(workdir.as_deref(), &cfg.tools.performance),
            workdir,
            correctness_args: cfg.tools.correctness_args.clone(),
            utilization_args: cfg.tools.utilization_args.clone(),
            correctness_marker: cfg.markers.correctness.clone(),
            performance_marker: cfg.markers.performance.clone(),
            timeout: Duration::from_secs(cfg.tools.timeout_secs),
            performance_runs: cfg.performance.runs,
        }
    }

    pub fn correctness_invocation(&self, trace: &Trace) -> Invocation {
        Invocation::new(&self.checker, self.timeout)
            .args(&self.correctness_args)
            .arg(self.trace_arg(trace))
            .workdir(self.workdir.clone())
    }

    pub fn utilization_invocation(&self, trace: &Trace) -> Invocation {
        Invocation::new(&self.checker, self.timeout)
            .args(&self.utilization_args)
            .arg(self.trace_arg(trace))
            .workdir(self.workdir.clone())
    }

    pub fn performance_invocation(&self, trace: &Trace) -> Invocation {
        Invocation::new(&self.performance, self.timeout)
            .arg(self.trace_arg(trace))
            .workdir(self.workdir.clone())
    }

    /// The tools run in `workdir`, so a cwd-relative trace path has to be
    /// made absolute before it is handed over.
    fn trace_arg(&self, trace: &Trace) -> OsString {
        match (&self.workdir, trace.path.is_relative()) {
            (Some(_), true) => std::env::current_dir()
                .map(|cwd| cwd.join(&trace.path))
                .unwrap_or_else(|_| trace.path.clone())
                .into_os_string(),
            _ => trace.path.clone().into_os_string(),
        }
    }
}

/// `./runner` relative to `workdir`; bare names (`make`) stay PATH lookups.
pub(crate) fn resolve_program(workdir: Option<&Path>, program: &Path) -> PathBuf {
    match workdir {
        Some(dir) if program.is_relative() && program.components().count() > 1 => {
            dir.join(program)
        }
        _ => program.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_tool_paths_follow_workdir() {
        let dir = Path::new("/lab");
        assert_eq!(
            resolve_program(Some(dir), Path::new("./runner")),
            PathBuf::from("/lab/./runner")
        );
        assert_eq!(
            resolve_program(Some(dir), Path::new("make")),
            PathBuf::from("make")
        );
        assert_eq!(
            resolve_program(None, Path::new("./runner")),
            PathBuf::from("./runner")
        );
    }

    #[test]
    fn default_invocations_match_lab_command_lines() {
        let s = ProbeSettings::from_config(&HarnessConfig::default());
        let t = Trace {
            path: PathBuf::from("./traces/short1.rep"),
            operation_count: 12,
        };

        assert_eq!(
            s.correctness_invocation(&t).to_string(),
            "./runner -r ./traces/short1.rep"
        );
        assert_eq!(
            s.utilization_invocation(&t).to_string(),
            "./runner -ru ./traces/short1.rep"
        );
        assert_eq!(
            s.performance_invocation(&t).to_string(),
            "./performance ./traces/short1.rep"
        );
        assert_eq!(s.performance_runs, 20);
    }
}

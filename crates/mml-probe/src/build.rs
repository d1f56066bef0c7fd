//! Clean rebuild of the allocator tools before grading.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use mml_config::BuildConfig;
use tracing::info;

use crate::process::{Invocation, ProcessError, ToolOutput, ToolRunner};
use crate::settings::resolve_program;

/// Build failures are environment problems: grading cannot start.
#[derive(Debug)]
pub enum BuildError {
    EmptyCommand { step: &'static str },
    Process(ProcessError),
    Failed {
        step: &'static str,
        code: Option<i32>,
        stderr_tail: String,
    },
    TimedOut { step: &'static str, after: Duration },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::EmptyCommand { step } => write!(f, "build step '{step}' has no command"),
            BuildError::Process(e) => write!(f, "build: {e}"),
            BuildError::Failed {
                step,
                code,
                stderr_tail,
            } => write!(
                f,
                "build step '{step}' failed (exit {}):\n{stderr_tail}",
                code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string())
            ),
            BuildError::TimedOut { step, after } => write!(
                f,
                "build step '{step}' timed out after {}s",
                after.as_secs()
            ),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Process(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProcessError> for BuildError {
    fn from(e: ProcessError) -> Self {
        BuildError::Process(e)
    }
}

const STDERR_TAIL_LINES: usize = 20;

/// Run the clean step, then the build step. No-op when disabled.
pub async fn rebuild<R: ToolRunner + ?Sized>(
    runner: &R,
    cfg: &BuildConfig,
    workdir: Option<&Path>,
) -> Result<(), BuildError> {
    if !cfg.enabled {
        info!("build disabled; using existing tool binaries");
        return Ok(());
    }
    let timeout = Duration::from_secs(cfg.timeout_secs);
    run_step(runner, "clean", &cfg.clean, workdir, timeout).await?;
    run_step(runner, "all", &cfg.all, workdir, timeout).await?;
    Ok(())
}

async fn run_step<R: ToolRunner + ?Sized>(
    runner: &R,
    step: &'static str,
    argv: &[String],
    workdir: Option<&Path>,
    timeout: Duration,
) -> Result<(), BuildError> {
    let (program, args) = argv
        .split_first()
        .ok_or(BuildError::EmptyCommand { step })?;
    let inv = Invocation::new(resolve_program(workdir, Path::new(program)), timeout)
        .args(args)
        .workdir(workdir.map(Path::to_path_buf));

    info!(step, cmd = %inv, "build");
    match runner.run(&inv).await? {
        ToolOutput::Completed(out) if out.success => Ok(()),
        ToolOutput::Completed(out) => Err(BuildError::Failed {
            step,
            code: out.exit_code,
            stderr_tail: tail_lines(&out.stderr, STDERR_TAIL_LINES),
        }),
        ToolOutput::TimedOut { after } => Err(BuildError::TimedOut { step, after }),
    }
}

fn tail_lines(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

//! Subprocess execution with an explicit timeout and guaranteed teardown.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// One external command: explicit argv, optional cwd, hard time bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub workdir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn workdir(mut self, dir: Option<PathBuf>) -> Self {
        self.workdir = dir;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for a in &self.args {
            write!(f, " {}", a.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Completed(CapturedOutput),
    /// Time bound hit; the child and its descendants have been killed and
    /// the child reaped.
    TimedOut { after: Duration },
}

/// The tool could not be run at all (missing binary, permissions, broken
/// pipe to the child). Fatal for the grading run.
#[derive(Debug)]
pub enum ProcessError {
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    Io {
        program: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Spawn { program, source } => {
                write!(f, "failed to start {}: {}", program.display(), source)
            }
            ProcessError::Io { program, source } => {
                write!(f, "i/o error while running {}: {}", program.display(), source)
            }
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Spawn { source, .. } | ProcessError::Io { source, .. } => Some(source),
        }
    }
}

/// Seam between the probes and the operating system.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ProcessError>;
}

#[async_trait]
impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ProcessError> {
        (**self).run(invocation).await
    }
}

/// Real runner on `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, inv: &Invocation) -> Result<ToolOutput, ProcessError> {
        debug!(cmd = %inv, timeout_ms = inv.timeout.as_millis() as u64, "spawn");

        let mut cmd = Command::new(&inv.program);
        cmd.args(&inv.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &inv.workdir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: inv.program.clone(),
            source,
        })?;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // Pipes are drained while waiting so a chatty child cannot block on
        // a full pipe buffer. The buffers outlive the bounded future, so a
        // partial read survives a timeout.
        let bounded = tokio::time::timeout(inv.timeout, async {
            tokio::join!(
                child.wait(),
                read_pipe(stdout_pipe, &mut stdout),
                read_pipe(stderr_pipe, &mut stderr)
            )
        })
        .await;

        let status = match bounded {
            Ok((status, out_read, err_read)) => {
                let io_err = |source| ProcessError::Io {
                    program: inv.program.clone(),
                    source,
                };
                out_read.map_err(io_err)?;
                err_read.map_err(io_err)?;
                status.map_err(io_err)?
            }
            Err(_) => match child.try_wait() {
                // The child exited but a descendant kept the pipes open.
                Ok(Some(status)) => {
                    warn!(cmd = %inv, "output pipes held open after exit; using partial output");
                    status
                }
                _ => {
                    kill_process_tree(child.id());
                    // kill() also waits, so no zombie is left behind.
                    if let Err(e) = child.kill().await {
                        debug!(cmd = %inv, error = %e, "kill after timeout failed");
                    }
                    debug!(cmd = %inv, "timed out");
                    return Ok(ToolOutput::TimedOut { after: inv.timeout });
                }
            },
        };

        debug!(cmd = %inv, code = ?status.code(), "exited");
        Ok(ToolOutput::Completed(CapturedOutput {
            exit_code: status.code(),
            success: status.success(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }))
    }
}

/// Kill every descendant of `pid`, deepest first. The root itself is left
/// to the caller so it can be reaped.
fn kill_process_tree(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    let root = sysinfo::Pid::from_u32(pid);

    let mut sys = sysinfo::System::new();
    sys.refresh_processes(sysinfo::ProcessesToUpdate::All, true);

    let mut children_map: HashMap<sysinfo::Pid, Vec<sysinfo::Pid>> = HashMap::new();
    for (p, proc_) in sys.processes() {
        if let Some(parent) = proc_.parent() {
            children_map.entry(parent).or_default().push(*p);
        }
    }

    let mut tree = Vec::new();
    collect_process_tree(root, &children_map, &mut tree);

    for pid in tree.into_iter().skip(1).rev() {
        if let Some(proc_) = sys.process(pid) {
            if !proc_.kill() {
                debug!(pid = pid.as_u32(), "descendant kill failed");
            }
        }
    }
}

fn collect_process_tree(
    pid: sysinfo::Pid,
    children_map: &HashMap<sysinfo::Pid, Vec<sysinfo::Pid>>,
    out: &mut Vec<sysinfo::Pid>,
) {
    out.push(pid);
    if let Some(children) = children_map.get(&pid) {
        for child in children {
            collect_process_tree(*child, children_map, out);
        }
    }
}

/// Append everything from `pipe` to `buf`, one chunk at a time, so whatever
/// arrived before a cancellation is kept.
async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>, buf: &mut Vec<u8>) -> std::io::Result<()> {
    let Some(mut p) = pipe else {
        return Ok(());
    };
    let mut chunk = [0u8; 8192];
    loop {
        let n = p.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

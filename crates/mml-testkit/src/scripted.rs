use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mml_probe::{CapturedOutput, Invocation, ProcessError, ToolOutput, ToolRunner};

/// The checker's correctness line.
pub const CORRECTNESS_PASS: &str = "umalloc package passed correctness check.";

struct Rule {
    program: String,
    leading_args: Vec<OsString>,
    /// Popped front to back; the last one repeats forever.
    outputs: Mutex<VecDeque<ToolOutput>>,
}

impl Rule {
    fn matches(&self, inv: &Invocation) -> bool {
        Path::new(&inv.program).ends_with(&self.program)
            && inv.args.len() >= self.leading_args.len()
            && inv.args[..self.leading_args.len()] == self.leading_args[..]
    }

    fn next(&self) -> ToolOutput {
        let mut q = self.outputs.lock().unwrap();
        if q.len() > 1 {
            q.pop_front().unwrap()
        } else {
            q.front().cloned().unwrap()
        }
    }
}

/// Replays canned tool outputs and records every invocation.
///
/// A rule matches on the program's trailing path component(s) plus an exact
/// leading-argument prefix; any remaining arguments (the trace path) are free.
/// Unmatched invocations behave like a missing binary.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every matching invocation with `output`.
    pub fn on(self, program: &str, leading_args: &[&str], output: ToolOutput) -> Self {
        self.on_sequence(program, leading_args, vec![output])
    }

    /// Answer matching invocations with `outputs` in order, repeating the
    /// last one once the sequence is exhausted.
    pub fn on_sequence(
        mut self,
        program: &str,
        leading_args: &[&str],
        outputs: Vec<ToolOutput>,
    ) -> Self {
        assert!(!outputs.is_empty(), "scripted rule needs at least one output");
        self.rules.push(Rule {
            program: program.to_string(),
            leading_args: leading_args.iter().map(OsString::from).collect(),
            outputs: Mutex::new(outputs.into()),
        });
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded invocations of `program` starting with `leading_args`.
    pub fn count(&self, program: &str, leading_args: &[&str]) -> usize {
        let lead: Vec<OsString> = leading_args.iter().map(OsString::from).collect();
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|inv| {
                Path::new(&inv.program).ends_with(program)
                    && inv.args.len() >= lead.len()
                    && inv.args[..lead.len()] == lead[..]
            })
            .count()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ProcessError> {
        self.calls.lock().unwrap().push(invocation.clone());
        match self.rules.iter().find(|r| r.matches(invocation)) {
            Some(rule) => Ok(rule.next()),
            None => Err(ProcessError::Spawn {
                program: invocation.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no scripted output"),
            }),
        }
    }
}

pub fn completed(stdout: &str) -> ToolOutput {
    exit_with(0, stdout)
}

pub fn exit_with(code: i32, stdout: &str) -> ToolOutput {
    ToolOutput::Completed(CapturedOutput {
        exit_code: Some(code),
        success: code == 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

pub fn timed_out() -> ToolOutput {
    ToolOutput::TimedOut {
        after: Duration::from_secs(60),
    }
}

/// What `runner -r` / `runner -ru` print on a clean run.
pub fn checker_output(utilization_pct: f64) -> String {
    format!(
        "Welcome to the MM lab runner\n\nAuthor: Test Student\n{CORRECTNESS_PASS}\n\
Final Utilization percentage: {utilization_pct:.2}\n"
    )
}

/// What `performance` prints for one trial.
pub fn perf_output(elapsed_us: u64) -> String {
    format!("Success: {elapsed_us}")
}

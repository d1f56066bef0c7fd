//! Test doubles for the grading pipeline. Used ONLY from tests.

mod fixtures;
mod scripted;

pub use fixtures::{trace, TraceDir};
pub use scripted::{
    checker_output, completed, exit_with, perf_output, timed_out, ScriptedRunner,
    CORRECTNESS_PASS,
};

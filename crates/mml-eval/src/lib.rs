//! mml-eval
//!
//! Per-trace orchestration of the probes and the report they accumulate into.
//!
//! Pipeline: TRACE FILE -> HEADER -> CORRECTNESS -> (UTILIZATION, PERFORMANCE)
//!
//! - Traces run one at a time, in catalog order.
//! - Utilization and performance only run after correctness passed.
//! - A malformed header costs that trace only.

mod evaluator;
mod report;

pub use evaluator::{evaluate_all, TraceEvaluator};
pub use report::{Report, TraceResult};

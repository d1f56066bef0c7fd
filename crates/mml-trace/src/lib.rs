//! mml-trace
//!
//! Trace discovery and the one header field the harness reads.
//!
//! Trace file header:
//! - line 0: reserved for the allocator's own trace reader (ignored here)
//! - line 1: total operation count, decimal
//!
//! Nothing past line 1 is validated; that is the external tools' job.

mod catalog;
mod header;

pub use catalog::{discover, CatalogError, TraceFile};
pub use header::{parse_operation_count, MalformedTraceError, Trace};

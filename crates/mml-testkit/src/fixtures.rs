use std::fs;
use std::path::{Path, PathBuf};

use mml_trace::{Trace, TraceFile};
use tempfile::TempDir;

/// Temporary traces directory.
pub struct TraceDir {
    dir: TempDir,
}

impl TraceDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp traces dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a trace whose header declares `operation_count`.
    pub fn add(&self, name: &str, operation_count: u64) -> PathBuf {
        self.add_raw(name, &format!("4096\n{operation_count}\n1\na 0 2040\n"))
    }

    pub fn add_raw(&self, name: &str, content: &str) -> PathBuf {
        let p = self.dir.path().join(name);
        fs::write(&p, content).expect("write trace fixture");
        p
    }

    pub fn file(&self, name: &str) -> TraceFile {
        TraceFile::new(self.dir.path().join(name))
    }
}

impl Default for TraceDir {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory trace (no file behind it).
pub fn trace(name: &str, operation_count: u64) -> Trace {
    Trace {
        path: PathBuf::from(format!("./traces/{name}")),
        operation_count,
    }
}

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A candidate workload file found during discovery. Its header has not been
/// read yet; see [`crate::Trace::load`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFile {
    pub path: PathBuf,
}

impl TraceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Display for TraceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// The traces directory itself could not be listed. This is an environment
/// problem, not a per-trace one.
#[derive(Debug)]
pub struct CatalogError {
    pub dir: PathBuf,
    pub source: std::io::Error,
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot list traces directory {}: {}",
            self.dir.display(),
            self.source
        )
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// List every regular file in `dir` whose name ends with `.<extension>`.
///
/// Order is whatever the directory listing yields. Callers must not read
/// meaning into it.
pub fn discover(dir: &Path, extension: &str) -> Result<Vec<TraceFile>, CatalogError> {
    let wrap = |source| CatalogError {
        dir: dir.to_path_buf(),
        source,
    };
    let suffix = format!(".{}", extension.trim_start_matches('.'));

    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(wrap)? {
        let entry = entry.map_err(wrap)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            debug!(entry = ?entry.path(), "skipping non-utf8 file name");
            continue;
        };
        if !name.ends_with(&suffix) {
            continue;
        }
        // Follows symlinks, so a linked trace still counts.
        if !entry.path().is_file() {
            continue;
        }
        out.push(TraceFile::new(dir.join(name)));
    }

    debug!(dir = %dir.display(), found = out.len(), "trace discovery done");
    Ok(out)
}

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::TraceFile;

/// A trace whose header was read successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub path: PathBuf,
    /// Declared number of allocator operations (header line 1).
    pub operation_count: u64,
}

impl Trace {
    /// Read the header of `file`. Only the first two lines are read; the
    /// body may hold anything, including bytes that are not UTF-8.
    pub fn load(file: &TraceFile) -> Result<Self, MalformedTraceError> {
        let io_err = |e: io::Error| MalformedTraceError::Io {
            path: file.path.clone(),
            reason: e.to_string(),
        };
        let mut reader = BufReader::new(File::open(&file.path).map_err(io_err)?);

        let mut line = Vec::new();
        reader.read_until(b'\n', &mut line).map_err(io_err)?;
        line.clear();
        if reader.read_until(b'\n', &mut line).map_err(io_err)? == 0 {
            return Err(MalformedTraceError::MissingCountLine {
                path: file.path.clone(),
            });
        }

        let operation_count = match std::str::from_utf8(&line) {
            Ok(text) => parse_count_line(text),
            Err(_) => Err(MalformedTraceError::BadCount {
                path: PathBuf::new(),
                value: String::from_utf8_lossy(&line).trim().to_string(),
            }),
        }
        .map_err(|e| e.with_path(file.path.clone()))?;
        Ok(Self {
            path: file.path.clone(),
            operation_count,
        })
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Trace header could not be used. Recoverable: only the affected trace is
/// lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedTraceError {
    Io { path: PathBuf, reason: String },
    MissingCountLine { path: PathBuf },
    BadCount { path: PathBuf, value: String },
}

impl MalformedTraceError {
    fn with_path(self, path: PathBuf) -> Self {
        match self {
            MalformedTraceError::Io { reason, .. } => MalformedTraceError::Io { path, reason },
            MalformedTraceError::MissingCountLine { .. } => {
                MalformedTraceError::MissingCountLine { path }
            }
            MalformedTraceError::BadCount { value, .. } => {
                MalformedTraceError::BadCount { path, value }
            }
        }
    }
}

impl fmt::Display for MalformedTraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedTraceError::Io { path, reason } => {
                write!(f, "{}: read failed: {}", path.display(), reason)
            }
            MalformedTraceError::MissingCountLine { path } => {
                write!(f, "{}: header has no operation-count line", path.display())
            }
            MalformedTraceError::BadCount { path, value } => write!(
                f,
                "{}: operation count is not a non-negative integer: {:?}",
                path.display(),
                value
            ),
        }
    }
}

impl std::error::Error for MalformedTraceError {}

/// Parse the operation count from trace content (pure).
///
/// Errors carry an empty path; [`Trace::load`] fills it in.
pub fn parse_operation_count(content: &str) -> Result<u64, MalformedTraceError> {
    let line = content
        .lines()
        .nth(1)
        .ok_or(MalformedTraceError::MissingCountLine {
            path: PathBuf::new(),
        })?;
    parse_count_line(line)
}

fn parse_count_line(line: &str) -> Result<u64, MalformedTraceError> {
    let value = line.trim();
    value.parse::<u64>().map_err(|_| MalformedTraceError::BadCount {
        path: PathBuf::new(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_bytes(bytes: &[u8]) -> Result<Trace, MalformedTraceError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.rep");
        std::fs::write(&path, bytes).unwrap();
        Trace::load(&TraceFile::new(path))
    }

    #[test]
    fn binary_body_after_good_header_loads() {
        let mut bytes = b"4096\n1400\n1\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        assert_eq!(load_bytes(&bytes).unwrap().operation_count, 1400);
    }

    #[test]
    fn non_utf8_count_line_is_bad_count() {
        let err = load_bytes(b"4096\n14\xff0\n").unwrap_err();
        assert!(matches!(err, MalformedTraceError::BadCount { .. }), "{err:?}");
        assert!(err.to_string().contains("t.rep"));
    }

    #[test]
    fn loaded_header_matches_string_parser() {
        assert_eq!(load_bytes(b"1\r\n  42 \r\n").unwrap().operation_count, 42);
        assert!(matches!(
            load_bytes(b"20000\n"),
            Err(MalformedTraceError::MissingCountLine { .. })
        ));
        assert!(matches!(
            load_bytes(b""),
            Err(MalformedTraceError::MissingCountLine { .. })
        ));
        assert!(matches!(
            load_bytes(b"0\n\n"),
            Err(MalformedTraceError::BadCount { .. })
        ));
    }

    #[test]
    fn reads_second_line() {
        assert_eq!(parse_operation_count("20000\n1400\n0\na 0 2040\n"), Ok(1400));
    }

    #[test]
    fn tolerates_surrounding_whitespace_and_crlf() {
        assert_eq!(parse_operation_count("1\r\n  42 \r\n"), Ok(42));
    }

    #[test]
    fn single_line_is_missing_count() {
        assert!(matches!(
            parse_operation_count("20000\n"),
            Err(MalformedTraceError::MissingCountLine { .. })
        ));
        assert!(matches!(
            parse_operation_count(""),
            Err(MalformedTraceError::MissingCountLine { .. })
        ));
    }

    #[test]
    fn non_integer_and_negative_counts_are_rejected() {
        for bad in ["abc", "-5", "12.5", ""] {
            let content = format!("0\n{bad}\n");
            assert!(
                matches!(
                    parse_operation_count(&content),
                    Err(MalformedTraceError::BadCount { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}

//! Positional output contract of the external tools.
//!
//! Checker in utilization mode: line 4 (0-based), token 3 is the percentage.
//!
//! ```text
//! Welcome to the MM lab runner
//!
//! Author: ...
//! umalloc package passed correctness check.
//! Final Utilization percentage: 71.25
//! ```
//!
//! Performance binary: token 1 is the integer elapsed time.
//!
//! ```text
//! Success: 5120
//! ```

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedOutputError {
    MissingLine { index: usize },
    MissingToken { index: usize },
    BadNumber { token: String },
}

impl fmt::Display for MalformedOutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedOutputError::MissingLine { index } => {
                write!(f, "expected output line {index}")
            }
            MalformedOutputError::MissingToken { index } => {
                write!(f, "expected whitespace token {index}")
            }
            MalformedOutputError::BadNumber { token } => write!(f, "not a number: {token:?}"),
        }
    }
}

impl std::error::Error for MalformedOutputError {}

pub const UTILIZATION_LINE: usize = 4;
pub const UTILIZATION_TOKEN: usize = 3;
pub const ELAPSED_TOKEN: usize = 1;

/// Utilization percentage from checker output.
pub fn parse_utilization(stdout: &str) -> Result<f64, MalformedOutputError> {
    let line = stdout
        .lines()
        .nth(UTILIZATION_LINE)
        .ok_or(MalformedOutputError::MissingLine {
            index: UTILIZATION_LINE,
        })?;
    let token = line
        .split_whitespace()
        .nth(UTILIZATION_TOKEN)
        .ok_or(MalformedOutputError::MissingToken {
            index: UTILIZATION_TOKEN,
        })?;
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(MalformedOutputError::BadNumber {
            token: token.to_string(),
        }),
    }
}

/// Elapsed time of one performance trial, in the tool's native unit.
pub fn parse_elapsed(stdout: &str) -> Result<u64, MalformedOutputError> {
    let token = stdout
        .split_whitespace()
        .nth(ELAPSED_TOKEN)
        .ok_or(MalformedOutputError::MissingToken {
            index: ELAPSED_TOKEN,
        })?;
    token
        .parse::<u64>()
        .map_err(|_| MalformedOutputError::BadNumber {
            token: token.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNER_UTIL_OK: &str = "Welcome to the MM lab runner\n\nAuthor: Ada\n\
umalloc package passed correctness check.\nFinal Utilization percentage: 71.25\n";

    #[test]
    fn utilization_reads_fifth_line_fourth_token() {
        assert_eq!(parse_utilization(RUNNER_UTIL_OK), Ok(71.25));
    }

    #[test]
    fn utilization_short_output_is_malformed() {
        assert_eq!(
            parse_utilization("Welcome\n\nAuthor: x\n"),
            Err(MalformedOutputError::MissingLine { index: 4 })
        );
        assert_eq!(
            parse_utilization("a\nb\nc\nd\nFinal Utilization\n"),
            Err(MalformedOutputError::MissingToken { index: 3 })
        );
    }

    #[test]
    fn utilization_rejects_non_numbers() {
        for bad in ["abc", "NaN", "inf"] {
            let out = format!("a\nb\nc\nd\nFinal Utilization percentage: {bad}\n");
            assert!(
                matches!(
                    parse_utilization(&out),
                    Err(MalformedOutputError::BadNumber { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn elapsed_reads_second_token() {
        assert_eq!(parse_elapsed("Success: 5120"), Ok(5120));
        assert_eq!(parse_elapsed("Success: 0\n"), Ok(0));
    }

    #[test]
    fn elapsed_without_number_is_malformed() {
        assert_eq!(
            parse_elapsed("Success:"),
            Err(MalformedOutputError::MissingToken { index: 1 })
        );
        assert!(matches!(
            parse_elapsed("Success: 12.5"),
            Err(MalformedOutputError::BadNumber { .. })
        ));
    }
}

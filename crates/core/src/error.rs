//! Error type shared by every fallible operation in the crate
//!
//! Classification itself never fails: numeric edge cases fall through the step
//! functions and degenerate samples have defined fallbacks. Errors only come from
//! contract violations (mismatched shapes) and from the I/O collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by grid construction, decoding, persistence and ingestion.
#[derive(Error, Debug)]
pub enum WrlrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two arrays that must be paired cell-for-cell have different dimensions.
    #[error("shape mismatch: expected {expected_rows}x{expected_cols}, got {found_rows}x{found_cols}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        found_rows: usize,
        found_cols: usize,
    },

    /// A flat value buffer does not hold `rows * cols` elements.
    #[error("grid of {rows}x{cols} needs {expected} values, got {found}")]
    BadLength {
        rows: usize,
        cols: usize,
        expected: usize,
        found: usize,
    },

    #[error("truncated payload in {path}: expected {expected} bytes, got {found}")]
    TruncatedPayload {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("unknown radar site '{0}'")]
    UnknownSite(String),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("invalid duration '{0}' (expected e.g. 450s, 30m, 1h, 2d)")]
    InvalidDuration(String),

    /// A classifier parameter is outside its usable range.
    #[error("invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A text record (mask row, CSV field) could not be interpreted.
    #[error("malformed record at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl WrlrError {
    pub(crate) fn shape(expected: (usize, usize), found: (usize, usize)) -> Self {
        Self::ShapeMismatch {
            expected_rows: expected.0,
            expected_cols: expected.1,
            found_rows: found.0,
            found_cols: found.1,
        }
    }
}

/// Result type for crate operations.
pub type Result<T> = std::result::Result<T, WrlrError>;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Failures of the analysis pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("unreadable file: {0}")]
    UnreadableFile(#[from] UnreadableFile),

    /// An aggregate needs at least one claim. Distinct from a computed zero.
    #[error("insufficient data: {operation} requires at least one claim")]
    InsufficientData { operation: &'static str },

    #[error("claims frame query failed: {0}")]
    Frame(String),
}

impl From<PolarsError> for AnalysisError {
    fn from(err: PolarsError) -> Self {
        Self::Frame(err.to_string())
    }
}

impl AnalysisError {
    pub fn insufficient(operation: &'static str) -> Self {
        Self::InsufficientData { operation }
    }
}

/// Reasons an uploaded claims file could not be turned into a claims table.
#[derive(Debug, Error, PartialEq)]
pub enum UnreadableFile {
    #[error("unsupported file format '{0}' (expected csv, xlsx, xls, xlsm or ods)")]
    UnsupportedFormat(String),

    #[error("failed to parse {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("workbook contains no worksheet")]
    EmptyWorkbook,

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: column {column} {reason}")]
    InvalidCell {
        row: usize,
        column: &'static str,
        reason: String,
    },

    #[error("row {row}: duplicate claim id '{claim_id}'")]
    DuplicateClaimId { row: usize, claim_id: String },

    #[error("file too large: {0}")]
    TooLarge(String),
}

//! Centralized error types for salesmail.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by the salesmail library.
#[derive(Error, Debug)]
pub enum SalesMailError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file or directory does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The email container is not a valid MIME message.
    #[error("Not a valid MIME message: {0}")]
    Parse(String),

    /// An attachment filename used an encoded-word that could not be decoded.
    #[error("Cannot decode attachment filename '{filename}': {reason}")]
    FilenameDecode { filename: String, reason: String },

    /// The title cell does not contain a `dd/mm/yyyy - dd/mm/yyyy` range.
    #[error("No date range in the expected format dd/mm/yyyy - dd/mm/yyyy (title cell: {cell:?})")]
    DateRangeNotFound { cell: String },

    /// A captured date is not a real calendar date.
    #[error("Invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    /// The workbook could not be opened or the sheet is missing.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Writing CSV output failed.
    #[error("CSV error: {0}")]
    Csv(String),
}

/// Convenience alias for `Result<T, SalesMailError>`.
pub type Result<T> = std::result::Result<T, SalesMailError>;

/// Coarse failure class, as reported per work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The container could not be parsed.
    Parse,
    /// One attachment filename could not be decoded.
    FilenameDecode,
    /// The spreadsheet does not follow the report layout.
    ReportFormat,
    /// A filesystem or serialization operation failed.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Parse => "parse",
            Self::FilenameDecode => "filename-decode",
            Self::ReportFormat => "report-format",
            Self::Io => "io",
        };
        f.write_str(s)
    }
}

impl SalesMailError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error for per-item reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) => ErrorKind::Parse,
            Self::FilenameDecode { .. } => ErrorKind::FilenameDecode,
            Self::DateRangeNotFound { .. } | Self::InvalidDate { .. } | Self::Spreadsheet(_) => {
                ErrorKind::ReportFormat
            }
            Self::Io { .. } | Self::FileNotFound(_) | Self::Csv(_) => ErrorKind::Io,
        }
    }
}

impl From<csv::Error> for SalesMailError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<calamine::Error> for SalesMailError {
    fn from(e: calamine::Error) -> Self {
        Self::Spreadsheet(e.to_string())
    }
}

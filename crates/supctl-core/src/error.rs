//! Error types for the decision core

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing tabular files
#[derive(Debug, Error)]
pub enum TableError {
    /// Underlying CSV reader/writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO failure on a table path
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data row does not have one cell per header
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The file carries no header row
    #[error("Table has no header row")]
    MissingHeader,
}

/// Errors raised by the violation scanner.
///
/// These indicate a column selection that does not match the data, so they
/// are fatal for the scan that hit them.
#[derive(Debug, Error, PartialEq)]
pub enum ScanError {
    /// A cell in a compared column could not be read as a number
    #[error("Column '{column}' row {row}: cannot coerce '{raw}' to a number")]
    Coercion {
        column: String,
        row: usize,
        raw: String,
    },

    /// None of the configured time column names is present
    #[error("No time column found (looked for {candidates:?})")]
    MissingTimeColumn { candidates: Vec<String> },
}

/// Errors raised by the pairing store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a cached series file failed
    #[error("Series cache error: {0}")]
    Table(#[from] TableError),
}

/// Errors raised while emitting a control request
#[derive(Debug, Error)]
pub enum EmitError {
    /// Writing the local instruction artifact failed
    #[error("Failed to write artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the shared control request report failed
    #[error("Failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the control request failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error reported by a control request sink
#[derive(Debug, Error)]
#[error("Control request submission failed: {0}")]
pub struct SinkError(pub String);

/// Result alias for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Result alias for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

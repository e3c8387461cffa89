//! Error types for the Tally library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Tally operations.
///
/// Data-quality problems (empty keys, low-confidence matches) are never
/// errors; they travel as [`ValidationIssue`](crate::ValidationIssue) and
/// [`KeySuggestion`](crate::KeySuggestion) values. Only I/O failures and
/// malformed schema descriptors surface here.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backup snapshot could not be written. The repair pass that
    /// requested it is aborted with no mutation applied.
    #[error("backup write failed for '{path}': {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The schema descriptor file is structurally invalid.
    #[error("schema descriptor error: {0}")]
    Descriptor(String),

    /// A table was referenced by name but never loaded.
    #[error("table '{0}' is not loaded")]
    TableNotLoaded(String),

    /// A column was referenced by name but does not exist in its table.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Empty file or no data.
    #[error("empty data: {0}")]
    EmptyData(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Tally operations.
pub type Result<T> = std::result::Result<T, TallyError>;

//! Error types for dataset loading.

use std::io;
use std::path::PathBuf;

/// Errors that can occur when loading a survey file.
#[derive(Debug, thiserror::Error)]
pub enum DatasetLoadError {
    #[error("dataset file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("schema mismatch: missing columns {missing:?}")]
    SchemaMismatch { missing: Vec<String> },

    #[error("row {row} has no value for the target column")]
    MissingTarget { row: usize },

    #[error("dataset contains no rows")]
    Empty,
}

//! Error types for feature engineering.

/// Errors raised while turning raw records into features.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("row {row}: value {value:?} is not a known category of column '{column}'")]
    UnmappedCategory {
        column: &'static str,
        value: String,
        row: usize,
    },

    #[error("row {row}: column '{column}' must be positive and finite for the log transform, got {value}")]
    InvalidNumericDomain {
        column: &'static str,
        value: f64,
        row: usize,
    },

    #[error("row {row} has no target label")]
    MissingTarget { row: usize },

    #[error("transformer has not been fitted")]
    NotFitted,

    #[error("cannot fit on an empty record set")]
    EmptyInput,

    #[error("expected {expected} columns, got {found}")]
    ColumnCountMismatch { expected: usize, found: usize },
}

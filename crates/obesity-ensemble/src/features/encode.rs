//! Categorical encoders.
//!
//! Binary and ordinal columns resolve through the closed level sets in
//! [`crate::data::raw`] and fail on anything else. The transport one-hot
//! encoder is the exception: categories it did not see during fitting encode
//! to an all-zero block.

use serde::{Deserialize, Serialize};

use super::error::FeatureError;
use crate::data::CategoryLevel;

/// Resolve a categorical value against its closed level set.
///
/// # Errors
///
/// [`FeatureError::UnmappedCategory`] if `value` is not a level of `T`.
pub fn parse_level<T: CategoryLevel>(
    column: &'static str,
    value: &str,
    row: usize,
) -> Result<T, FeatureError> {
    T::from_label(value).ok_or_else(|| FeatureError::UnmappedCategory {
        column,
        value: value.to_string(),
        row,
    })
}

// =============================================================================
// OneHotEncoder
// =============================================================================

/// One-hot encoder for a single column with a dropped reference category.
///
/// Categories are learned at fit time and kept sorted. The reference
/// category gets no indicator, so a row of that category encodes to zeros,
/// as does any category not seen during fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    column: String,
    /// Categories with an indicator column, sorted.
    categories: Vec<String>,
    reference: String,
}

impl OneHotEncoder {
    /// Learn the categories of `column` from `values`, dropping `reference`.
    pub fn fit<'a>(
        column: &str,
        values: impl IntoIterator<Item = &'a str>,
        reference: &str,
    ) -> Self {
        let mut categories: Vec<String> = values
            .into_iter()
            .filter(|v| *v != reference)
            .map(str::to_string)
            .collect();
        categories.sort_unstable();
        categories.dedup();

        Self {
            column: column.to_string(),
            categories,
            reference: reference.to_string(),
        }
    }

    /// Number of indicator columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// The dropped reference category.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Indicator column names, `{column}_{category}`.
    pub fn output_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", self.column, c))
            .collect()
    }

    /// Write the indicator block for `value` into `out`.
    ///
    /// `out` must have length [`width`](Self::width).
    pub fn encode_into(&self, value: &str, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.width());
        out.fill(0.0);
        if let Ok(idx) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            out[idx] = 1.0;
        }
    }
}

//! Numeric transforms: natural log and min-max scaling.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::error::FeatureError;

/// Natural log of a strictly positive, finite value.
///
/// # Errors
///
/// [`FeatureError::InvalidNumericDomain`] for zero, negative or non-finite
/// input.
#[inline]
pub fn log_transform(column: &'static str, value: f64, row: usize) -> Result<f64, FeatureError> {
    if value > 0.0 && value.is_finite() {
        Ok(value.ln())
    } else {
        Err(FeatureError::InvalidNumericDomain { column, value, row })
    }
}

/// Pass a finite value through unchanged.
///
/// # Errors
///
/// [`FeatureError::InvalidNumericDomain`] for NaN or infinite input.
#[inline]
pub fn require_finite(column: &'static str, value: f64, row: usize) -> Result<f64, FeatureError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FeatureError::InvalidNumericDomain { column, value, row })
    }
}

// =============================================================================
// MinMaxScaler
// =============================================================================

/// Per-column affine rescaling to [0, 1] using fitted bounds.
///
/// `x' = (x - min) / (max - min)`. A constant column has range 0 and is
/// only shifted, so it maps to 0. Values outside the fitted bounds are not
/// clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit column bounds on `[n_rows, n_columns]` data.
    ///
    /// # Errors
    ///
    /// [`FeatureError::EmptyInput`] if `data` has no rows.
    pub fn fit(data: &Array2<f64>) -> Result<Self, FeatureError> {
        if data.nrows() == 0 {
            return Err(FeatureError::EmptyInput);
        }
        let data_min = data
            .axis_iter(Axis(1))
            .map(|col| col.iter().copied().fold(f64::INFINITY, f64::min))
            .collect();
        let data_max = data
            .axis_iter(Axis(1))
            .map(|col| col.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect();
        Ok(Self { data_min, data_max })
    }

    /// Number of columns the scaler was fitted on.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data_min.len()
    }

    /// Fitted column minima.
    pub fn data_min(&self) -> &[f64] {
        &self.data_min
    }

    /// Fitted column maxima.
    pub fn data_max(&self) -> &[f64] {
        &self.data_max
    }

    /// Rescale `data` in place.
    ///
    /// # Errors
    ///
    /// [`FeatureError::ColumnCountMismatch`] if the column count differs
    /// from the fitted one.
    pub fn transform_inplace(&self, data: &mut Array2<f64>) -> Result<(), FeatureError> {
        if data.ncols() != self.n_features() {
            return Err(FeatureError::ColumnCountMismatch {
                expected: self.n_features(),
                found: data.ncols(),
            });
        }
        for (j, mut col) in data.axis_iter_mut(Axis(1)).enumerate() {
            let min = self.data_min[j];
            let range = self.data_max[j] - min;
            let scale = if range == 0.0 { 1.0 } else { 1.0 / range };
            col.mapv_inplace(|x| (x - min) * scale);
        }
        Ok(())
    }
}

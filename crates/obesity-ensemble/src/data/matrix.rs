//! Named dense feature matrices.

use ndarray::{Array2, ArrayView2, Axis};

/// Dense row-major feature matrix with named columns.
///
/// Shape is `[n_rows, n_columns]`. Values are `f32`, which is what the tree
/// learners consume.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f32>,
}

impl FeatureMatrix {
    /// Create a matrix, checking that the names match the column count.
    ///
    /// # Panics
    ///
    /// Panics if `names.len()` differs from the number of columns.
    pub fn new(names: Vec<String>, values: Array2<f32>) -> Self {
        assert_eq!(
            names.len(),
            values.ncols(),
            "column names ({}) do not match matrix width ({})",
            names.len(),
            values.ncols()
        );
        Self { names, values }
    }

    /// Column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.values.ncols()
    }

    /// Read-only view of the values.
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// Consume into the raw array.
    pub fn into_values(self) -> Array2<f32> {
        self.values
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Keep only the given columns, in the given order.
    ///
    /// Returns `None` if any name is unknown.
    pub fn select_columns(&self, names: &[&str]) -> Option<Self> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Option<Vec<usize>>>()?;
        Some(Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            values: self.values.select(Axis(1), &indices),
        })
    }

    /// Keep only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }
}

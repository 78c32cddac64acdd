//! Classification metrics.

use ndarray::ArrayView2;

/// Fraction of predictions equal to the labels.
///
/// Returns 0 for empty input.
pub fn accuracy(labels: &[u32], predictions: &[u32]) -> f64 {
    debug_assert_eq!(labels.len(), predictions.len());
    if labels.is_empty() {
        return 0.0;
    }
    let correct = labels.iter().zip(predictions).filter(|(y, p)| y == p).count();
    correct as f64 / labels.len() as f64
}

/// Mean multiclass log loss of `[n_rows, n_classes]` probabilities.
///
/// Probabilities are clamped to `[1e-15, 1]` before the log.
pub fn multiclass_logloss(probabilities: ArrayView2<'_, f32>, labels: &[u32]) -> f64 {
    debug_assert_eq!(probabilities.nrows(), labels.len());
    if labels.is_empty() {
        return 0.0;
    }
    let total: f64 = probabilities
        .rows()
        .into_iter()
        .zip(labels)
        .map(|(row, &label)| {
            let p = (row[label as usize] as f64).clamp(1e-15, 1.0);
            -p.ln()
        })
        .sum();
    total / labels.len() as f64
}

/// Per-class row counts for labels in `0..n_classes`.
pub fn class_counts(labels: &[u32], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &label in labels {
        if let Some(c) = counts.get_mut(label as usize) {
            *c += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn accuracy_counts_matches() {
        assert_relative_eq!(accuracy(&[0, 1, 2, 2], &[0, 1, 1, 2]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn logloss_of_confident_predictions() {
        let probs = array![[0.9f32, 0.1], [0.2, 0.8]];
        let expected = -(0.9f64.ln() + 0.8f64.ln()) / 2.0;
        assert_relative_eq!(multiclass_logloss(probs.view(), &[0, 1]), expected, epsilon = 1e-6);
    }

    #[test]
    fn class_counts_ignore_out_of_range() {
        assert_eq!(class_counts(&[0, 2, 2, 5], 3), vec![1, 0, 2]);
    }
}

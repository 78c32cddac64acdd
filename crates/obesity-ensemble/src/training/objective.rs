//! Softmax cross-entropy objective for multiclass boosting.
//!
//! # Layout
//!
//! Margins, gradients and hessians are column-major: `[n_classes * n_rows]`,
//! all rows of class 0 first. Labels are class indices.

/// Gradient and hessian of one (row, class) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradsTuple {
    pub grad: f32,
    pub hess: f32,
}

/// Softmax cross-entropy loss.
#[derive(Debug, Clone, Copy)]
pub struct SoftmaxLoss {
    /// Number of classes.
    pub n_classes: usize,
}

impl SoftmaxLoss {
    const HESS_MIN: f32 = 1e-6;

    pub fn new(n_classes: usize) -> Self {
        debug_assert!(n_classes >= 2, "n_classes must be >= 2");
        Self { n_classes }
    }

    /// Log class priors, the starting margin of every class.
    ///
    /// Priors are clamped away from 0 so absent classes get a finite score.
    pub fn base_score(&self, labels: &[u32]) -> Vec<f32> {
        let k = self.n_classes;
        if labels.is_empty() {
            return vec![0.0; k];
        }
        let mut counts = vec![0.0f64; k];
        for &label in labels {
            counts[label as usize] += 1.0;
        }
        let n = labels.len() as f64;
        counts
            .iter()
            .map(|&c| (c / n).clamp(1e-7, 1.0 - 1e-7).ln() as f32)
            .collect()
    }

    /// Fill `grad_hess` from the current `margins`.
    ///
    /// `grad = p - y`, `hess = max(p (1 - p), 1e-6)`.
    pub fn compute_gradients(&self, margins: &[f32], labels: &[u32], grad_hess: &mut [GradsTuple]) {
        let k = self.n_classes;
        let n_rows = labels.len();
        debug_assert_eq!(margins.len(), k * n_rows);
        debug_assert_eq!(grad_hess.len(), k * n_rows);

        let mut probs = vec![0.0f32; k];
        for (i, &label) in labels.iter().enumerate() {
            for (c, p) in probs.iter_mut().enumerate() {
                *p = margins[c * n_rows + i];
            }
            softmax_inplace(&mut probs);

            for (c, &p) in probs.iter().enumerate() {
                let target = if c == label as usize { 1.0 } else { 0.0 };
                grad_hess[c * n_rows + i] = GradsTuple {
                    grad: p - target,
                    hess: (p * (1.0 - p)).max(Self::HESS_MIN),
                };
            }
        }
    }
}

/// Numerically stable in-place softmax.
pub fn softmax_inplace(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        values.iter_mut().for_each(|v| *v /= sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn softmax_sums_to_one() {
        let mut v = [1.0f32, 2.0, 3.0];
        softmax_inplace(&mut v);
        assert_relative_eq!(v.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert!(v[2] > v[1] && v[1] > v[0]);

        let mut large = [1000.0f32, 1000.0];
        softmax_inplace(&mut large);
        assert_eq!(large, [0.5, 0.5]);
    }

    #[test]
    fn gradient_signs() {
        let obj = SoftmaxLoss::new(3);
        // column-major: class 0 [1, 0], class 1 [0, 1], class 2 [0, 0]
        let margins = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
        let labels = [0u32, 1];
        let mut grad_hess = [GradsTuple::default(); 6];
        obj.compute_gradients(&margins, &labels, &mut grad_hess);

        assert!(grad_hess[0].grad < 0.0);
        assert!(grad_hess[2].grad > 0.0);
        assert!(grad_hess[3].grad < 0.0);
        // gradients of one row sum to zero
        assert_relative_eq!(grad_hess[0].grad + grad_hess[2].grad + grad_hess[4].grad, 0.0, epsilon = 1e-6);
        assert!(grad_hess.iter().all(|gh| gh.hess > 0.0));
    }

    #[test]
    fn base_score_is_log_prior() {
        let obj = SoftmaxLoss::new(3);
        let base = obj.base_score(&[0, 0, 1, 2]);
        assert_relative_eq!(base[0], 0.5f32.ln(), epsilon = 1e-6);
        assert_relative_eq!(base[1], base[2]);

        let absent = SoftmaxLoss::new(3).base_score(&[0, 1]);
        assert!(absent[2].is_finite());
    }
}

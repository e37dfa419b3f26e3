//! Regression metrics for held-out evaluation.
//!
//! Metrics are diagnostic: they are reported after training and never decide
//! whether a fitted model is kept.

/// A metric for evaluating model quality.
pub trait Metric: Send + Sync {
    /// Compute the metric value from predictions and labels.
    fn compute(&self, preds: &[f64], labels: &[f64]) -> f64;
}

fn squared_error_sum(preds: &[f64], labels: &[f64]) -> f64 {
    preds
        .iter()
        .zip(labels)
        .map(|(p, l)| {
            let diff = p - l;
            diff * diff
        })
        .sum()
}

// =============================================================================
// MSE (Mean Squared Error)
// =============================================================================

/// Mean Squared Error: mean((pred - label)²)
#[derive(Debug, Clone, Copy, Default)]
pub struct Mse;

impl Metric for Mse {
    fn compute(&self, preds: &[f64], labels: &[f64]) -> f64 {
        debug_assert_eq!(preds.len(), labels.len());

        if preds.is_empty() {
            return 0.0;
        }

        squared_error_sum(preds, labels) / preds.len() as f64
    }
}

// =============================================================================
// RMSE (Root Mean Squared Error)
// =============================================================================

/// Root Mean Squared Error: sqrt(mean((pred - label)²))
#[derive(Debug, Clone, Copy, Default)]
pub struct Rmse;

impl Metric for Rmse {
    fn compute(&self, preds: &[f64], labels: &[f64]) -> f64 {
        Mse.compute(preds, labels).sqrt()
    }
}

// =============================================================================
// MAE (Mean Absolute Error)
// =============================================================================

/// Mean Absolute Error: mean(|pred - label|)
///
/// Lower is better. More robust to outliers than RMSE.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mae;

impl Metric for Mae {
    fn compute(&self, preds: &[f64], labels: &[f64]) -> f64 {
        debug_assert_eq!(preds.len(), labels.len());

        if preds.is_empty() {
            return 0.0;
        }

        preds
            .iter()
            .zip(labels)
            .map(|(p, l)| (p - l).abs())
            .sum::<f64>()
            / preds.len() as f64
    }
}

// =============================================================================
// R² (Coefficient of Determination)
// =============================================================================

/// Coefficient of determination: 1 - SS_res / SS_tot
///
/// Higher is better, at most 1. A constant label vector has no variance to
/// explain: the score is 1 for a perfect fit and 0 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct R2;

impl Metric for R2 {
    fn compute(&self, preds: &[f64], labels: &[f64]) -> f64 {
        debug_assert_eq!(preds.len(), labels.len());

        if labels.is_empty() {
            return 0.0;
        }

        let mean = labels.iter().sum::<f64>() / labels.len() as f64;
        let ss_tot: f64 = labels.iter().map(|l| (l - mean).powi(2)).sum();
        let ss_res = squared_error_sum(preds, labels);

        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn mse_rmse_mae() {
        let preds = [1.0, 2.0, 3.0, 4.0];
        let labels = [1.0, 3.0, 3.0, 2.0];
        assert_abs_diff_eq!(Mse.compute(&preds, &labels), 1.25);
        assert_abs_diff_eq!(Rmse.compute(&preds, &labels), 1.25f64.sqrt());
        assert_abs_diff_eq!(Mae.compute(&preds, &labels), 0.75);
    }

    #[test]
    fn r2_perfect_and_mean() {
        let labels = [1.0, 2.0, 3.0];
        assert_abs_diff_eq!(R2.compute(&labels, &labels), 1.0);
        assert_abs_diff_eq!(R2.compute(&[2.0, 2.0, 2.0], &labels), 0.0);
        // SS_res = 2, SS_tot = 2
        assert_abs_diff_eq!(R2.compute(&[2.0, 3.0, 3.0], &labels), 0.0);
        assert!(R2.compute(&[3.0, 2.0, 1.0], &labels) < 0.0);
    }

    #[test]
    fn r2_constant_labels() {
        assert_eq!(R2.compute(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(R2.compute(&[4.0, 5.0], &[5.0, 5.0]), 0.0);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(Mse.compute(&[], &[]), 0.0);
        assert_eq!(Mae.compute(&[], &[]), 0.0);
        assert_eq!(R2.compute(&[], &[]), 0.0);
    }
}

//! Held-out evaluation summary.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::metric::{Mae, Metric, Mse, Rmse, R2};

/// Metrics computed once per training run on the held-out rows.
///
/// Diagnostic only: nothing reads these to accept or reject a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Mean squared error.
    pub mse: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Coefficient of determination.
    pub r2: f64,
    /// Rows used for fitting.
    pub n_train: usize,
    /// Rows held out.
    pub n_test: usize,
}

impl EvaluationReport {
    /// Score held-out predictions.
    pub fn compute(preds: &[f64], labels: &[f64], n_train: usize) -> Self {
        Self {
            mse: Mse.compute(preds, labels),
            rmse: Rmse.compute(preds, labels),
            mae: Mae.compute(preds, labels),
            r2: R2.compute(preds, labels),
            n_train,
            n_test: labels.len(),
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mse={:.4} rmse={:.4} mae={:.4} r2={:.4} (train={}, test={})",
            self.mse, self.rmse, self.mae, self.r2, self.n_train, self.n_test
        )
    }
}

//! Random forest representation: an unweighted average of regression trees.

use ndarray::{Array1, ArrayView2};

use super::tree::{RegressionTree, TreeValidationError};

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForestValidationError {
    /// Forest has no trees.
    #[error("forest has no trees")]
    EmptyForest,

    /// A tree failed validation.
    #[error("tree {index}: {source}")]
    InvalidTree {
        index: usize,
        #[source]
        source: TreeValidationError,
    },
}

/// Ensemble of regression trees over a fixed number of features.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl Forest {
    /// Create a forest from already-built trees.
    pub fn from_trees(trees: Vec<RegressionTree>, n_features: usize) -> Self {
        Self { trees, n_features }
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of input columns every tree expects.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &RegressionTree> {
        self.trees.iter()
    }

    /// Mean prediction of all trees for one row.
    ///
    /// An empty forest predicts NaN; [`validate`](Self::validate) rejects it.
    pub fn predict_row(&self, features: &[f64]) -> f64 {
        debug_assert_eq!(features.len(), self.n_features);
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(features)).sum();
        sum / self.trees.len() as f64
    }

    /// Predict every row of a `[n_rows, n_features]` matrix.
    pub fn predict_rows(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        features
            .rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.predict_row(slice),
                None => self.predict_row(&row.to_vec()),
            })
            .collect()
    }

    /// Impurity-based importance per feature, normalized to sum to 1.
    ///
    /// All zeros when no tree has a split.
    pub fn feature_importance(&self) -> Vec<f64> {
        let mut importance = vec![0.0; self.n_features];
        for tree in &self.trees {
            tree.accumulate_importance(&mut importance);
        }
        let total: f64 = importance.iter().sum();
        if total > 0.0 {
            importance.iter_mut().for_each(|v| *v /= total);
        }
        importance
    }

    /// Validate every tree and its feature references.
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        if self.trees.is_empty() {
            return Err(ForestValidationError::EmptyForest);
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .and_then(|()| tree.validate_features(self.n_features))
                .map_err(|source| ForestValidationError::InvalidTree { index, source })?;
        }
        Ok(())
    }
}

//! Model metadata.

use serde::{Deserialize, Serialize};

use crate::training::{EvaluationReport, ForestConfig};

/// Facts about how a [`FittedModel`](super::FittedModel) was produced.
///
/// Stored alongside the forest so an artifact can be inspected without the
/// dataset it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Configuration the forest was trained with.
    pub config: ForestConfig,
    /// Complete rows available for training and evaluation.
    pub n_rows: usize,
    /// Incomplete rows discarded before the split.
    pub n_dropped: usize,
    /// Held-out metrics from the training run.
    pub evaluation: Option<EvaluationReport>,
    /// Version of this crate that wrote the model.
    pub crate_version: String,
}

impl ModelMeta {
    /// Metadata for a model trained by this build.
    pub fn new(config: ForestConfig, n_rows: usize, n_dropped: usize) -> Self {
        Self {
            config,
            n_rows,
            n_dropped,
            evaluation: None,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Attach the evaluation report.
    pub fn with_evaluation(mut self, report: EvaluationReport) -> Self {
        self.evaluation = Some(report);
        self
    }
}

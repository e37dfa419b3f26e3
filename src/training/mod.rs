//! Random forest training.
//!
//! - [`ForestConfig`]: validated training parameters
//! - [`train_test_split`]: seeded hold-out partition
//! - [`TreeGrower`]: CART regression tree on a bootstrap sample
//! - [`ForestTrainer`]: fits the ensemble, optionally on the rayon pool
//! - [`Metric`] and [`EvaluationReport`]: held-out diagnostics

mod eval;
mod grower;
mod metric;
mod params;
pub mod sampling;
mod split;
mod trainer;

pub use eval::EvaluationReport;
pub use grower::{GrowerParams, TreeGrower};
pub use metric::{Mae, Metric, Mse, Rmse, R2};
pub use params::{ConfigError, ForestConfig, MaxFeatures, Verbosity};
pub use split::{test_size, train_test_split, TrainTestSplit};
pub use trainer::ForestTrainer;

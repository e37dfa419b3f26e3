//! High-level model API.
//!
//! [`FittedModel`] ties a trained [`Forest`](crate::repr::Forest) to the
//! [`FeatureSchema`](crate::encoding::FeatureSchema) it was trained on and
//! exposes training, prediction and feature importance.

mod fitted;
mod meta;

pub use fitted::{FittedModel, MIN_TRAINING_ROWS};
pub use meta::ModelMeta;

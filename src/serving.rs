//! Serving workflow: an explicitly owned model slot.
//!
//! [`ServingState`] starts [`Uninitialized`](ServingState::Uninitialized) and
//! becomes [`Ready`](ServingState::Ready) after a successful
//! [`initialize`](ServingState::initialize). Predictions never mutate it. A
//! failed initialization always leaves it `Uninitialized`, even when a model
//! was being served before.
//!
//! # Example
//!
//! ```
//! use harmony_splash::data::InboundRecord;
//! use harmony_splash::serving::ServingState;
//! use harmony_splash::Error;
//!
//! let state = ServingState::new();
//! let inbound = InboundRecord::new().with("Activity", "Shower");
//! assert!(matches!(state.predict(&inbound), Err(Error::NotFitted)));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::data::{InboundRecord, RawRecord, TrainingDataset};
use crate::encoding::EncodedRow;
use crate::io::PersistenceError;
use crate::model::FittedModel;
use crate::training::ForestConfig;
use crate::{Error, Result};

// =============================================================================
// ModelSource
// =============================================================================

/// Where the served model comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Fit a fresh model from a CSV dataset, optionally persisting it.
    Train {
        dataset: PathBuf,
        config: ForestConfig,
        save_to: Option<PathBuf>,
    },
    /// Load a previously saved artifact.
    Load { path: PathBuf },
    /// Load `model` if it exists, otherwise train from `dataset`.
    ///
    /// With `save` set, a freshly trained model is written to `model` so the
    /// next process loads it instead of refitting. An artifact that exists but
    /// cannot be read is an error, not a reason to retrain.
    LoadOrTrain {
        model: PathBuf,
        dataset: PathBuf,
        config: ForestConfig,
        save: bool,
    },
}

// =============================================================================
// Prediction
// =============================================================================

/// One predicted desired temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted temperature in degrees Celsius. Always finite.
    pub value: f64,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(digits) => write!(f, "Predicted Desired Temperature: {:.*}", digits, self.value),
            None => write!(f, "Predicted Desired Temperature: {}", self.value),
        }
    }
}

// =============================================================================
// ServingState
// =============================================================================

/// Model slot owned by the serving workflow.
#[derive(Debug, Clone, Default)]
pub enum ServingState {
    /// No model yet, or the last initialization failed.
    #[default]
    Uninitialized,
    /// A model is available for predictions.
    Ready(Box<FittedModel>),
}

impl ServingState {
    /// A state with no model.
    pub fn new() -> Self {
        Self::Uninitialized
    }

    /// A state serving an already fitted model.
    pub fn from_model(model: FittedModel) -> Self {
        Self::Ready(Box::new(model))
    }

    /// Whether a model is available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The served model, if any.
    pub fn model(&self) -> Option<&FittedModel> {
        match self {
            Self::Ready(model) => Some(&**model),
            Self::Uninitialized => None,
        }
    }

    /// Train or load a model and serve it.
    ///
    /// May be called again on a `Ready` state to reload. On failure the state
    /// becomes `Uninitialized` and the error is returned. Failing to persist a
    /// freshly trained model is logged, not returned: the model is still
    /// served.
    pub fn initialize(&mut self, source: &ModelSource) -> Result<&FittedModel> {
        *self = Self::Uninitialized;
        *self = Self::Ready(Box::new(obtain_model(source)?));
        let Self::Ready(model) = self else {
            unreachable!()
        };
        Ok(&**model)
    }

    /// Parse an inbound record and predict.
    pub fn predict(&self, inbound: &InboundRecord) -> Result<Prediction> {
        let model = self.ready()?;
        let record = inbound.to_raw_record()?;
        Ok(Prediction {
            value: model.predict_record(&record)?,
        })
    }

    /// Predict for an already typed record.
    pub fn predict_record(&self, record: &RawRecord) -> Result<Prediction> {
        let model = self.ready()?;
        Ok(Prediction {
            value: model.predict_record(record)?,
        })
    }

    /// Predict for an already encoded row; its columns must match the schema.
    pub fn predict_row(&self, row: &EncodedRow) -> Result<Prediction> {
        let model = self.ready()?;
        Ok(Prediction {
            value: model.predict_row(row)?,
        })
    }

    fn ready(&self) -> Result<&FittedModel> {
        self.model().ok_or(Error::NotFitted)
    }
}

fn obtain_model(source: &ModelSource) -> Result<FittedModel> {
    match source {
        ModelSource::Train {
            dataset,
            config,
            save_to,
        } => train_and_save(dataset, config, save_to.as_deref()),
        ModelSource::Load { path } => load(path),
        ModelSource::LoadOrTrain {
            model,
            dataset,
            config,
            save,
        } => match load(model) {
            Err(Error::Persistence(PersistenceError::MissingFile { path })) => {
                info!("no model at {}, training a new one", path.display());
                train_and_save(dataset, config, save.then_some(model.as_path()))
            }
            other => other,
        },
    }
}

fn load(path: &Path) -> Result<FittedModel> {
    let model = FittedModel::load(path)?;
    info!(
        "loaded model from {} ({} trees, {} columns)",
        path.display(),
        model.forest().n_trees(),
        model.schema().width()
    );
    Ok(model)
}

fn train_and_save(
    dataset: &Path,
    config: &ForestConfig,
    save_to: Option<&Path>,
) -> Result<FittedModel> {
    let data = TrainingDataset::from_csv_path(dataset)?;
    let (model, _report) = FittedModel::train(&data, config)?;

    if let Some(path) = save_to {
        match model.save(path) {
            Ok(()) => info!("saved model to {}", path.display()),
            Err(e) => warn!("could not save model to {}: {}", path.display(), e),
        }
    }
    Ok(model)
}

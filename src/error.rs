//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the crate funnels into [`Error`]. The variants
//! mirror the failure classes a caller has to react to differently:
//!
//! - [`Error::Data`]: the training data is malformed or too small
//! - [`Error::SchemaMismatch`]: an inference-time vector disagrees with the frozen schema
//! - [`Error::NotFitted`]: a prediction was requested before a model exists
//! - [`Error::Persistence`]: a model artifact could not be written or read
//! - [`Error::InvalidInput`]: an inbound record is missing a field or has a bad number
//! - [`Error::Config`]: forest parameters or application settings are invalid

use crate::data::{DataError, InputError};
use crate::encoding::SchemaMismatch;
use crate::io::PersistenceError;
use crate::training::ConfigError;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any failure surfaced by the core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or insufficient training data.
    #[error("data error: {0}")]
    Data(#[from] DataError),

    /// Encoded features disagree with the schema the model was trained on.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatch),

    /// No model has been trained or loaded yet.
    #[error("no model is available: train or load a model before predicting")]
    NotFitted,

    /// Model artifact could not be saved or loaded.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Inbound record could not be turned into a raw record.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Invalid forest parameters or application settings.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Short, stable label for the error class (used in CLI output and logs).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Data(_) => "DataError",
            Self::SchemaMismatch(_) => "SchemaMismatch",
            Self::NotFitted => "NotFitted",
            Self::Persistence(_) => "PersistenceError",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Config(_) => "ConfigError",
        }
    }
}

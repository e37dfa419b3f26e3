//! Raw data: records, inbound form values, and the training dataset.
//!
//! - [`RawRecord`] / [`TrainingRow`]: typed observations
//! - [`InboundRecord`]: flat string mapping from the form layer
//! - [`TrainingDataset`]: CSV loader that drops incomplete rows

mod dataset;
mod error;
mod record;

pub use dataset::{TrainingDataset, TARGET_COLUMN};
pub use error::{DataError, InputError};
pub use record::{
    Activity, Categorical, CategoricalField, InboundRecord, NumericField, RawRecord, Season,
    TimeOfDay, TrainingRow,
};

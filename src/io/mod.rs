//! Model persistence.
//!
//! A [`FittedModel`](crate::model::FittedModel) is stored in the native
//! `.hspl` format: a fixed header with a CRC32 checksum followed by a
//! versioned Postcard payload holding the schema, the trees and the training
//! metadata. See [`native`] for the byte layout.

pub mod native;
pub mod payload;

mod convert;

use std::path::PathBuf;

pub use native::{DeserializeError, NativeCodec, SerializeError};
pub use payload::{Payload, PayloadV1};

/// Failure to write or read a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// No artifact exists at the given path.
    #[error("model file {} does not exist", path.display())]
    MissingFile { path: PathBuf },

    /// The model could not be written.
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// The artifact exists but is unreadable or invalid.
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}

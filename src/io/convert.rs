//! Conversion between [`FittedModel`] and storage payloads.
//!
//! # High-Level API
//!
//! ```
//! use harmony_splash::model::FittedModel;
//! use harmony_splash::testing::synthetic_dataset;
//! use harmony_splash::training::ForestConfig;
//!
//! let config = ForestConfig::builder().n_trees(5).build().unwrap();
//! let (model, _) = FittedModel::train(&synthetic_dataset(60, 2), &config).unwrap();
//!
//! let bytes = model.to_bytes().unwrap();
//! let restored = FittedModel::from_bytes(&bytes).unwrap();
//! assert_eq!(restored, model);
//! ```

use std::path::Path;

use log::debug;

use super::native::{DeserializeError, NativeCodec, SerializeError};
use super::payload::{ForestPayload, Payload, PayloadV1, TreePayload};
use super::PersistenceError;
use crate::encoding::FeatureSchema;
use crate::model::FittedModel;
use crate::repr::{Forest, RegressionTree, TreeParts};

// ============================================================================
// FittedModel Serialization API
// ============================================================================

impl FittedModel {
    /// Save the model to a file in native `.hspl` format.
    ///
    /// Missing parent directories are created. The bytes go to a sibling
    /// temporary file first and are renamed into place, so a reader never
    /// observes a half-written model.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(SerializeError::from)?;
        }
        let tmp = path.with_extension("hspl.tmp");
        std::fs::write(&tmp, &bytes).map_err(SerializeError::from)?;
        std::fs::rename(&tmp, path).map_err(SerializeError::from)?;

        debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Load a model from a file in native `.hspl` format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PersistenceError::MissingFile {
                path: path.to_path_buf(),
            },
            _ => DeserializeError::from(e).into(),
        })?;
        Ok(Self::from_bytes(&bytes)?)
    }

    /// Serialize the model to bytes, header included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        let payload = Payload::from_model(self);
        NativeCodec::new().serialize(
            self.forest().n_features() as u32,
            self.forest().n_trees() as u32,
            &payload,
        )
    }

    /// Deserialize a model from bytes produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let (header, payload): (_, Payload) = NativeCodec::new().deserialize(bytes)?;
        let model = payload.into_model()?;

        if header.num_features as usize != model.forest().n_features()
            || header.num_trees as usize != model.forest().n_trees()
        {
            return Err(DeserializeError::CorruptPayload(format!(
                "header describes {} features and {} trees, payload has {} and {}",
                header.num_features,
                header.num_trees,
                model.forest().n_features(),
                model.forest().n_trees()
            )));
        }
        Ok(model)
    }
}

// ============================================================================
// Model <-> Payload Conversion
// ============================================================================

impl Payload {
    /// Create a V1 payload from a fitted model.
    pub fn from_model(model: &FittedModel) -> Self {
        let forest = model.forest();
        Payload::V1(PayloadV1 {
            schema: model.schema().names().to_vec(),
            forest: ForestPayload {
                num_features: forest.n_features() as u32,
                trees: forest.trees().map(tree_to_payload).collect(),
            },
            meta: model.meta().clone(),
        })
    }

    /// Rebuild and validate a fitted model.
    pub fn into_model(self) -> Result<FittedModel, DeserializeError> {
        match self {
            Payload::V1(v1) => v1_into_model(v1),
        }
    }
}

fn v1_into_model(v1: PayloadV1) -> Result<FittedModel, DeserializeError> {
    let corrupt = |e: &dyn std::fmt::Display| DeserializeError::CorruptPayload(e.to_string());

    let schema = FeatureSchema::from_names(v1.schema).map_err(|e| corrupt(&e))?;

    let trees = v1
        .forest
        .trees
        .into_iter()
        .map(|t| RegressionTree::from_parts(payload_to_parts(t)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| corrupt(&e))?;

    let forest = Forest::from_trees(trees, v1.forest.num_features as usize);
    forest.validate().map_err(|e| corrupt(&e))?;

    FittedModel::from_parts(forest, schema, v1.meta).map_err(|e| corrupt(&e))
}

fn tree_to_payload(tree: &RegressionTree) -> TreePayload {
    let parts = tree.to_parts();
    TreePayload {
        split_features: parts.split_features,
        thresholds: parts.thresholds,
        left_children: parts.left_children,
        right_children: parts.right_children,
        is_leaf: parts.is_leaf,
        leaf_values: parts.leaf_values,
        gains: parts.gains,
        n_samples: parts.n_samples,
    }
}

fn payload_to_parts(payload: TreePayload) -> TreeParts {
    TreeParts {
        split_features: payload.split_features,
        thresholds: payload.thresholds,
        left_children: payload.left_children,
        right_children: payload.right_children,
        is_leaf: payload.is_leaf,
        leaf_values: payload.leaf_values,
        gains: payload.gains,
        n_samples: payload.n_samples,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::native::HEADER_SIZE;
    use crate::testing::synthetic_dataset;
    use crate::training::ForestConfig;

    fn model() -> FittedModel {
        let config = ForestConfig::builder().n_trees(4).seed(9).build().unwrap();
        FittedModel::train(&synthetic_dataset(60, 8), &config).unwrap().0
    }

    #[test]
    fn bytes_roundtrip_preserves_everything() {
        let model = model();
        let restored = FittedModel::from_bytes(&model.to_bytes().unwrap()).unwrap();

        assert_eq!(restored.schema(), model.schema());
        assert_eq!(restored.forest(), model.forest());
        assert_eq!(restored.meta(), model.meta());
    }

    #[test]
    fn file_roundtrip_predicts_identically() {
        let model = model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.hspl");

        model.save(&path).unwrap();
        let restored = FittedModel::load(&path).unwrap();

        let dataset = synthetic_dataset(20, 99);
        for record in dataset.records() {
            assert_eq!(
                restored.predict_record(record).unwrap(),
                model.predict_record(record).unwrap()
            );
        }
        assert!(!path.with_extension("hspl.tmp").exists());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.hspl");
        match FittedModel::load(&path) {
            Err(PersistenceError::MissingFile { path: p }) => assert_eq!(p, path),
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn flipped_payload_byte_is_detected() {
        let mut bytes = model().to_bytes().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x55;
        assert!(matches!(
            FittedModel::from_bytes(&bytes),
            Err(DeserializeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn foreign_file_is_rejected() {
        let mut bytes = model().to_bytes().unwrap();
        bytes[0..4].copy_from_slice(b"BSTR");
        assert!(matches!(
            FittedModel::from_bytes(&bytes),
            Err(DeserializeError::NotAModel)
        ));
        assert!(matches!(
            FittedModel::from_bytes(&bytes[..HEADER_SIZE - 1]),
            Err(DeserializeError::Truncated { .. })
        ));
    }

    #[test]
    fn invalid_schema_in_payload_is_corrupt() {
        let model = model();
        let mut payload = Payload::from_model(&model);
        let Payload::V1(v1) = &mut payload;
        v1.schema.swap(0, 1);
        v1.schema[0] = "Activity_Sauna".to_string();

        let bytes = NativeCodec::new()
            .serialize(
                model.forest().n_features() as u32,
                model.forest().n_trees() as u32,
                &payload,
            )
            .unwrap();
        assert!(matches!(
            FittedModel::from_bytes(&bytes),
            Err(DeserializeError::CorruptPayload(_))
        ));
    }

    #[test]
    fn header_disagreeing_with_payload_is_corrupt() {
        let model = model();
        let bytes = NativeCodec::new()
            .serialize(
                model.forest().n_features() as u32,
                model.forest().n_trees() as u32 + 1,
                &Payload::from_model(&model),
            )
            .unwrap();
        assert!(matches!(
            FittedModel::from_bytes(&bytes),
            Err(DeserializeError::CorruptPayload(_))
        ));
    }
}

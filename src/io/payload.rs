//! Payload structures for the native storage format.
//!
//! These mirror the runtime types but are plain data for Postcard. New format
//! versions add new [`Payload`] variants rather than modifying existing ones.

use serde::{Deserialize, Serialize};

use crate::model::ModelMeta;

/// Version-tagged payload enum for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    /// Version 1 payload format.
    V1(PayloadV1),
}

/// Version 1 payload structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadV1 {
    /// Encoded column names in schema order.
    pub schema: Vec<String>,
    /// Forest of trees.
    pub forest: ForestPayload,
    /// Training metadata.
    pub meta: ModelMeta,
}

/// Forest of regression trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestPayload {
    /// Number of input features every tree expects.
    pub num_features: u32,
    /// Individual tree payloads.
    pub trees: Vec<TreePayload>,
}

/// Single regression tree payload, one entry per node in every array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreePayload {
    /// Split feature indices (0 for leaves).
    pub split_features: Vec<u32>,
    /// Split thresholds (0.0 for leaves).
    pub thresholds: Vec<f64>,
    /// Left child indices (0 for leaves).
    pub left_children: Vec<u32>,
    /// Right child indices (0 for leaves).
    pub right_children: Vec<u32>,
    /// Whether each node is a leaf.
    pub is_leaf: Vec<bool>,
    /// Leaf values (0.0 for internal nodes).
    pub leaf_values: Vec<f64>,
    /// Squared-error reduction at each split.
    pub gains: Vec<f64>,
    /// Training rows reaching each node.
    pub n_samples: Vec<u32>,
}

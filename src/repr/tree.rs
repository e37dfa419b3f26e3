//! Regression tree storage (SoA) and the mutable construction API.
//!
//! - [`RegressionTree`]: immutable node arrays used for prediction and storage
//! - [`MutableTree`]: placeholder-then-fill builder used by the grower
//! - [`TreeParts`]: plain arrays for conversion to and from the payload format
//!
//! Splits are numeric only: a row goes left when `value <= threshold`.

/// Node identifier: an index into the tree's arrays. The root is 0.
pub type NodeId = u32;

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`RegressionTree`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    #[error("tree has no nodes")]
    EmptyTree,

    /// Parallel arrays disagree on the node count.
    #[error("`{array}` has {len} entries, expected {n_nodes}")]
    LengthMismatch {
        array: &'static str,
        len: usize,
        n_nodes: usize,
    },

    /// A child pointer references an out-of-bounds node.
    #[error("node {node}: {side} child {child} is out of bounds ({n_nodes} nodes)")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },

    /// A node references itself as a child.
    #[error("node {node} references itself")]
    SelfLoop { node: NodeId },

    /// A node was reached by more than one path.
    #[error("node {node} is reachable by more than one path")]
    DuplicateVisit { node: NodeId },

    /// A cycle was detected during traversal.
    #[error("cycle detected at node {node}")]
    CycleDetected { node: NodeId },

    /// A node exists in storage but is unreachable from the root.
    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },

    /// A split references a feature the forest does not have.
    #[error("node {node} splits on feature {feature}, forest has {n_features}")]
    FeatureOutOfBounds {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },

    /// A threshold or leaf value is NaN or infinite.
    #[error("node {node} holds a non-finite value")]
    NonFiniteValue { node: NodeId },
}

// ============================================================================
// TreeParts
// ============================================================================

/// Flat node arrays of a tree, one entry per node.
///
/// Internal nodes carry `split_features`, `thresholds`, the child indices and
/// `gains` (weighted squared-error reduction of the split). Leaves carry
/// `leaf_values`. `n_samples` is the number of (bootstrap) training rows that
/// reached the node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeParts {
    pub split_features: Vec<u32>,
    pub thresholds: Vec<f64>,
    pub left_children: Vec<NodeId>,
    pub right_children: Vec<NodeId>,
    pub is_leaf: Vec<bool>,
    pub leaf_values: Vec<f64>,
    pub gains: Vec<f64>,
    pub n_samples: Vec<u32>,
}

// ============================================================================
// RegressionTree
// ============================================================================

/// Structure-of-Arrays regression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    split_features: Box<[u32]>,
    thresholds: Box<[f64]>,
    left_children: Box<[NodeId]>,
    right_children: Box<[NodeId]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f64]>,
    gains: Box<[f64]>,
    n_samples: Box<[u32]>,
}

impl RegressionTree {
    /// Single-leaf tree predicting `value` for every row.
    pub fn leaf(value: f64, n_samples: u32) -> Self {
        let mut tree = MutableTree::new();
        let root = tree.init_root();
        tree.make_leaf(root, value, n_samples);
        tree.freeze()
    }

    /// Rebuild a tree from flat arrays, checking its structure.
    pub fn from_parts(parts: TreeParts) -> Result<Self, TreeValidationError> {
        let n_nodes = parts.is_leaf.len();
        let lengths = [
            ("split_features", parts.split_features.len()),
            ("thresholds", parts.thresholds.len()),
            ("left_children", parts.left_children.len()),
            ("right_children", parts.right_children.len()),
            ("leaf_values", parts.leaf_values.len()),
            ("gains", parts.gains.len()),
            ("n_samples", parts.n_samples.len()),
        ];
        for (array, len) in lengths {
            if len != n_nodes {
                return Err(TreeValidationError::LengthMismatch { array, len, n_nodes });
            }
        }

        let tree = Self {
            split_features: parts.split_features.into_boxed_slice(),
            thresholds: parts.thresholds.into_boxed_slice(),
            left_children: parts.left_children.into_boxed_slice(),
            right_children: parts.right_children.into_boxed_slice(),
            is_leaf: parts.is_leaf.into_boxed_slice(),
            leaf_values: parts.leaf_values.into_boxed_slice(),
            gains: parts.gains.into_boxed_slice(),
            n_samples: parts.n_samples.into_boxed_slice(),
        };
        tree.validate()?;
        Ok(tree)
    }

    /// Copy the node arrays out.
    pub fn to_parts(&self) -> TreeParts {
        TreeParts {
            split_features: self.split_features.to_vec(),
            thresholds: self.thresholds.to_vec(),
            left_children: self.left_children.to_vec(),
            right_children: self.right_children.to_vec(),
            is_leaf: self.is_leaf.to_vec(),
            leaf_values: self.leaf_values.to_vec(),
            gains: self.gains.to_vec(),
            n_samples: self.n_samples.to_vec(),
        }
    }

    /// Number of nodes in this tree.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.is_leaf.iter().filter(|&&l| l).count()
    }

    /// Check if a node is a leaf.
    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    /// Split feature of an internal node.
    #[inline]
    pub fn split_feature(&self, node: NodeId) -> u32 {
        self.split_features[node as usize]
    }

    /// Split threshold of an internal node.
    #[inline]
    pub fn threshold(&self, node: NodeId) -> f64 {
        self.thresholds[node as usize]
    }

    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    /// Prediction stored at a leaf.
    #[inline]
    pub fn leaf_value(&self, node: NodeId) -> f64 {
        self.leaf_values[node as usize]
    }

    /// Weighted squared-error reduction of the split at `node`.
    #[inline]
    pub fn gain(&self, node: NodeId) -> f64 {
        self.gains[node as usize]
    }

    /// Training rows that reached `node`.
    #[inline]
    pub fn n_samples(&self, node: NodeId) -> u32 {
        self.n_samples[node as usize]
    }

    /// Depth of the deepest leaf (a single-leaf tree has depth 0).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0 as NodeId, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if self.is_leaf(node) {
                max_depth = max_depth.max(depth);
            } else {
                stack.push((self.left_child(node), depth + 1));
                stack.push((self.right_child(node), depth + 1));
            }
        }
        max_depth
    }

    /// Leaf reached by `features`.
    pub fn leaf_for(&self, features: &[f64]) -> NodeId {
        let mut idx: NodeId = 0;
        while !self.is_leaf(idx) {
            let value = features
                .get(self.split_feature(idx) as usize)
                .copied()
                .unwrap_or(f64::NAN);
            // NaN compares false and goes right.
            idx = if value <= self.threshold(idx) {
                self.left_child(idx)
            } else {
                self.right_child(idx)
            };
        }
        idx
    }

    /// Predict one row.
    #[inline]
    pub fn predict_row(&self, features: &[f64]) -> f64 {
        self.leaf_value(self.leaf_for(features))
    }

    /// Add each split's gain to `importance[split_feature]`.
    pub fn accumulate_importance(&self, importance: &mut [f64]) {
        for node in 0..self.n_nodes() {
            if !self.is_leaf[node] {
                if let Some(slot) = importance.get_mut(self.split_features[node] as usize) {
                    *slot += self.gains[node];
                }
            }
        }
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, bool)> = vec![(0, false)];

        while let Some((node, finished)) = stack.pop() {
            let idx = node as usize;
            if finished {
                color[idx] = 2;
                continue;
            }
            match color[idx] {
                1 => return Err(TreeValidationError::CycleDetected { node }),
                2 => return Err(TreeValidationError::DuplicateVisit { node }),
                _ => {}
            }
            color[idx] = 1;
            stack.push((node, true));

            if self.is_leaf(node) {
                if !self.leaf_value(node).is_finite() {
                    return Err(TreeValidationError::NonFiniteValue { node });
                }
                continue;
            }
            if !self.threshold(node).is_finite() {
                return Err(TreeValidationError::NonFiniteValue { node });
            }

            let left = self.left_child(node);
            let right = self.right_child(node);
            if left == node || right == node {
                return Err(TreeValidationError::SelfLoop { node });
            }
            for (side, child) in [("left", left), ("right", right)] {
                if child as usize >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds {
                        node,
                        side,
                        child,
                        n_nodes,
                    });
                }
            }

            stack.push((right, false));
            stack.push((left, false));
        }

        if let Some(node) = color.iter().position(|&c| c == 0) {
            return Err(TreeValidationError::UnreachableNode { node: node as NodeId });
        }

        Ok(())
    }

    /// Check that every split references a feature below `n_features`.
    pub fn validate_features(&self, n_features: usize) -> Result<(), TreeValidationError> {
        for node in 0..self.n_nodes() {
            let feature = self.split_features[node];
            if !self.is_leaf[node] && feature as usize >= n_features {
                return Err(TreeValidationError::FeatureOutOfBounds {
                    node: node as NodeId,
                    feature,
                    n_features,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// MutableTree (training-time construction)
// =============================================================================

/// Mutable tree for use during training.
///
/// Nodes are allocated as placeholders first and filled in once the grower
/// decides whether they split or become leaves.
#[derive(Debug, Clone, Default)]
pub struct MutableTree {
    parts: TreeParts,
}

impl MutableTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset and allocate the root placeholder. Returns the root id (0).
    pub fn init_root(&mut self) -> NodeId {
        self.parts = TreeParts::default();
        self.allocate_node()
    }

    fn allocate_node(&mut self) -> NodeId {
        let id = self.parts.is_leaf.len() as NodeId;
        let p = &mut self.parts;
        p.split_features.push(0);
        p.thresholds.push(0.0);
        p.left_children.push(0);
        p.right_children.push(0);
        p.is_leaf.push(true);
        p.leaf_values.push(0.0);
        p.gains.push(0.0);
        p.n_samples.push(0);
        id
    }

    /// Turn `node` into a split, allocating its two children.
    ///
    /// Returns `(left_id, right_id)`.
    pub fn apply_split(
        &mut self,
        node: NodeId,
        feature: u32,
        threshold: f64,
        gain: f64,
        n_samples: u32,
    ) -> (NodeId, NodeId) {
        let left = self.allocate_node();
        let right = self.allocate_node();

        let idx = node as usize;
        let p = &mut self.parts;
        p.split_features[idx] = feature;
        p.thresholds[idx] = threshold;
        p.left_children[idx] = left;
        p.right_children[idx] = right;
        p.is_leaf[idx] = false;
        p.gains[idx] = gain;
        p.n_samples[idx] = n_samples;

        (left, right)
    }

    /// Finalize `node` as a leaf.
    pub fn make_leaf(&mut self, node: NodeId, value: f64, n_samples: u32) {
        let idx = node as usize;
        self.parts.is_leaf[idx] = true;
        self.parts.leaf_values[idx] = value;
        self.parts.n_samples[idx] = n_samples;
    }

    /// Freeze into an immutable tree.
    pub fn freeze(self) -> RegressionTree {
        let p = self.parts;
        RegressionTree {
            split_features: p.split_features.into_boxed_slice(),
            thresholds: p.thresholds.into_boxed_slice(),
            left_children: p.left_children.into_boxed_slice(),
            right_children: p.right_children.into_boxed_slice(),
            is_leaf: p.is_leaf.into_boxed_slice(),
            leaf_values: p.leaf_values.into_boxed_slice(),
            gains: p.gains.into_boxed_slice(),
            n_samples: p.n_samples.into_boxed_slice(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `x[feature] <= threshold ? left : right`
    pub(crate) fn stump(feature: u32, threshold: f64, left: f64, right: f64) -> RegressionTree {
        let mut tree = MutableTree::new();
        let root = tree.init_root();
        let (l, r) = tree.apply_split(root, feature, threshold, 1.0, 4);
        tree.make_leaf(l, left, 2);
        tree.make_leaf(r, right, 2);
        tree.freeze()
    }

    #[test]
    fn stump_routes_on_threshold() {
        let tree = stump(0, 0.5, 1.0, 2.0);
        assert_eq!(tree.predict_row(&[0.3]), 1.0);
        assert_eq!(tree.predict_row(&[0.5]), 1.0);
        assert_eq!(tree.predict_row(&[0.7]), 2.0);
        assert_eq!(tree.predict_row(&[f64::NAN]), 2.0);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn two_level_tree() {
        let mut tree = MutableTree::new();
        let root = tree.init_root();
        let (l, r) = tree.apply_split(root, 0, 10.0, 5.0, 10);
        tree.make_leaf(l, -1.0, 4);
        let (rl, rr) = tree.apply_split(r, 1, 0.5, 2.0, 6);
        tree.make_leaf(rl, 3.0, 3);
        tree.make_leaf(rr, 4.0, 3);
        let tree = tree.freeze();

        assert_eq!(tree.n_nodes(), 5);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.predict_row(&[5.0, 9.0]), -1.0);
        assert_eq!(tree.predict_row(&[15.0, 0.0]), 3.0);
        assert_eq!(tree.predict_row(&[15.0, 1.0]), 4.0);

        let mut importance = vec![0.0; 2];
        tree.accumulate_importance(&mut importance);
        assert_eq!(importance, vec![5.0, 2.0]);
    }

    #[test]
    fn parts_round_trip() {
        let tree = stump(1, 2.5, -3.0, 3.0);
        let rebuilt = RegressionTree::from_parts(tree.to_parts()).unwrap();
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn from_parts_rejects_bad_structure() {
        let mut parts = stump(0, 0.5, 1.0, 2.0).to_parts();
        parts.gains.pop();
        assert!(matches!(
            RegressionTree::from_parts(parts),
            Err(TreeValidationError::LengthMismatch { array: "gains", .. })
        ));

        let mut parts = stump(0, 0.5, 1.0, 2.0).to_parts();
        parts.right_children[0] = 9;
        assert!(matches!(
            RegressionTree::from_parts(parts),
            Err(TreeValidationError::ChildOutOfBounds { side: "right", .. })
        ));

        let mut parts = stump(0, 0.5, 1.0, 2.0).to_parts();
        parts.left_children[0] = 0;
        assert_eq!(
            RegressionTree::from_parts(parts),
            Err(TreeValidationError::SelfLoop { node: 0 })
        );

        let mut parts = stump(0, 0.5, 1.0, 2.0).to_parts();
        parts.right_children[0] = 1;
        assert!(matches!(
            RegressionTree::from_parts(parts),
            Err(TreeValidationError::DuplicateVisit { node: 1 })
        ));

        let mut parts = stump(0, 0.5, 1.0, 2.0).to_parts();
        parts.leaf_values[2] = f64::NAN;
        assert_eq!(
            RegressionTree::from_parts(parts),
            Err(TreeValidationError::NonFiniteValue { node: 2 })
        );

        assert_eq!(
            RegressionTree::from_parts(TreeParts::default()),
            Err(TreeValidationError::EmptyTree)
        );
    }

    #[test]
    fn feature_bounds() {
        let tree = stump(3, 0.5, 1.0, 2.0);
        assert!(tree.validate_features(4).is_ok());
        assert_eq!(
            tree.validate_features(3),
            Err(TreeValidationError::FeatureOutOfBounds {
                node: 0,
                feature: 3,
                n_features: 3
            })
        );
    }

    #[test]
    fn single_leaf() {
        let tree = RegressionTree::leaf(38.5, 7);
        assert_eq!(tree.predict_row(&[]), 38.5);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.n_samples(0), 7);
    }
}

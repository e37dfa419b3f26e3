//! CART regression tree grower.
//!
//! Grows one tree depth-first on a (bootstrap) sample of row indices:
//!
//! 1. A node becomes a leaf when it is too small, too deep, or pure.
//! 2. Otherwise features are visited in a fresh random order. At least
//!    `max_features` are inspected; if none of them admits a split the
//!    search continues through the remaining features.
//! 3. For each feature the candidate thresholds are midpoints between
//!    consecutive distinct values. The split maximizing the reduction of the
//!    squared error wins; ties keep the first candidate found.
//! 4. Rows with `value <= threshold` go left.
//!
//! Leaves predict the mean target of the sample rows that reach them.

use ndarray::{ArrayView1, ArrayView2};

use super::params::ForestConfig;
use super::sampling::{feature_order, TrainRng};
use crate::repr::{MutableTree, NodeId, RegressionTree};

/// Resolved per-tree growth limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowerParams {
    pub max_depth: Option<u32>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features inspected per node before the search may stop.
    pub max_features: usize,
}

impl GrowerParams {
    /// Limits for a forest over `n_features` columns.
    pub fn from_config(config: &ForestConfig, n_features: usize) -> Self {
        Self {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split as usize,
            min_samples_leaf: config.min_samples_leaf as usize,
            max_features: config.max_features.resolve(n_features),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: u32,
    threshold: f64,
    gain: f64,
}

/// Grows regression trees over a fixed training matrix.
#[derive(Debug, Clone)]
pub struct TreeGrower<'a> {
    features: ArrayView2<'a, f64>,
    targets: ArrayView1<'a, f64>,
    params: GrowerParams,
}

impl<'a> TreeGrower<'a> {
    /// Create a grower over `[n_rows, n_features]` features and `n_rows` targets.
    pub fn new(
        features: ArrayView2<'a, f64>,
        targets: ArrayView1<'a, f64>,
        params: GrowerParams,
    ) -> Self {
        debug_assert_eq!(features.nrows(), targets.len());
        Self {
            features,
            targets,
            params,
        }
    }

    /// Grow one tree on `rows` (indices into the training matrix, duplicates
    /// allowed).
    pub fn grow(&self, mut rows: Vec<u32>, rng: &mut TrainRng) -> RegressionTree {
        let mut tree = MutableTree::new();
        let root = tree.init_root();
        if rows.is_empty() {
            tree.make_leaf(root, 0.0, 0);
            return tree.freeze();
        }

        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(rows.len());
        let mut stack: Vec<(NodeId, usize, usize, u32)> = vec![(root, 0, rows.len(), 0)];

        while let Some((node, start, end, depth)) = stack.pop() {
            let node_rows = &mut rows[start..end];
            let n = node_rows.len();
            let sum: f64 = node_rows.iter().map(|&i| self.target(i)).sum();
            let mean = sum / n as f64;

            let split = if self.may_split(node_rows, depth) {
                self.best_split(node_rows, sum, rng, &mut pairs)
            } else {
                None
            };

            match split {
                None => tree.make_leaf(node, mean, n as u32),
                Some(split) => {
                    let n_left = self.partition(node_rows, split.feature, split.threshold);
                    let (left, right) =
                        tree.apply_split(node, split.feature, split.threshold, split.gain, n as u32);
                    stack.push((right, start + n_left, end, depth + 1));
                    stack.push((left, start, start + n_left, depth + 1));
                }
            }
        }

        tree.freeze()
    }

    #[inline]
    fn target(&self, row: u32) -> f64 {
        self.targets[row as usize]
    }

    #[inline]
    fn value(&self, row: u32, feature: u32) -> f64 {
        self.features[[row as usize, feature as usize]]
    }

    fn may_split(&self, rows: &[u32], depth: u32) -> bool {
        let n = rows.len();
        if n < self.params.min_samples_split || n < 2 * self.params.min_samples_leaf {
            return false;
        }
        if self.params.max_depth.is_some_and(|d| depth >= d) {
            return false;
        }
        let first = self.target(rows[0]);
        rows.iter().any(|&i| self.target(i) != first)
    }

    fn best_split(
        &self,
        rows: &[u32],
        total_sum: f64,
        rng: &mut TrainRng,
        pairs: &mut Vec<(f64, f64)>,
    ) -> Option<SplitCandidate> {
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf;
        let parent_score = total_sum * total_sum / n as f64;
        let mut best: Option<SplitCandidate> = None;

        for (inspected, feature) in feature_order(self.features.ncols(), rng)
            .into_iter()
            .enumerate()
        {
            if inspected >= self.params.max_features && best.is_some() {
                break;
            }

            pairs.clear();
            pairs.extend(rows.iter().map(|&i| (self.value(i, feature), self.target(i))));
            pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
            if pairs[0].0 == pairs[n - 1].0 {
                continue;
            }

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += pairs[k].1;
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_right < min_leaf {
                    break;
                }
                let (lo, hi) = (pairs[k].0, pairs[k + 1].0);
                if n_left < min_leaf || lo == hi {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                // Squared-error reduction of the parent.
                let gain = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / n_right as f64
                    - parent_score;
                if best.map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(lo, hi),
                        gain,
                    });
                }
            }
        }

        best.map(|b| SplitCandidate {
            gain: b.gain.max(0.0),
            ..b
        })
    }

    /// Move rows going left to the front; returns how many there are.
    fn partition(&self, rows: &mut [u32], feature: u32, threshold: f64) -> usize {
        let mut n_left = 0;
        for k in 0..rows.len() {
            if self.value(rows[k], feature) <= threshold {
                rows.swap(n_left, k);
                n_left += 1;
            }
        }
        n_left
    }
}

/// Threshold between two consecutive distinct values, always `>= lo` and `< hi`.
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi {
        lo
    } else {
        mid
    }
}

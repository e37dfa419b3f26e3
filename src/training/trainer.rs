//! Random forest trainer.
//!
//! Every tree gets its own seed from [`tree_seeds`], its own bootstrap sample
//! and its own feature orders. Trees are independent, so they are fitted on
//! the rayon pool when `parallel` is set; the collected forest keeps seed
//! order either way.
//!
//! # Example
//!
//! ```
//! use harmony_splash::training::{ForestConfig, ForestTrainer};
//! use ndarray::array;
//!
//! let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
//! let y = array![5.0, 5.0, 5.0, 9.0, 9.0, 9.0];
//!
//! let config = ForestConfig::builder().n_trees(10).build().unwrap();
//! let forest = ForestTrainer::new(config).fit(x.view(), y.view());
//! assert_eq!(forest.n_trees(), 10);
//! ```

use log::{debug, info};
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

use super::grower::{GrowerParams, TreeGrower};
use super::params::{ForestConfig, Verbosity};
use super::sampling::{bootstrap_indices, rng_from_seed, tree_seeds};
use crate::repr::{Forest, RegressionTree};

/// Fits a [`Forest`] according to a [`ForestConfig`].
#[derive(Debug, Clone)]
pub struct ForestTrainer {
    config: ForestConfig,
}

impl ForestTrainer {
    /// Create a new trainer.
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit a forest on `[n_rows, n_features]` features and `n_rows` targets.
    pub fn fit<'a>(&self, features: ArrayView2<'a, f64>, targets: ArrayView1<'a, f64>) -> Forest {
        let n_rows = features.nrows();
        let n_features = features.ncols();
        let n_trees = self.config.n_trees as usize;
        debug_assert_eq!(n_rows, targets.len());

        let params = GrowerParams::from_config(&self.config, n_features);
        let grower = TreeGrower::new(features, targets, params);
        let seeds = tree_seeds(self.config.seed, n_trees);

        if self.config.verbosity >= Verbosity::Info {
            info!(
                "fitting {} trees on {} rows x {} features (max_features = {})",
                n_trees, n_rows, n_features, params.max_features
            );
        }

        let fit_one = |(index, &seed): (usize, &u64)| -> RegressionTree {
            let mut rng = rng_from_seed(seed);
            let rows = if self.config.bootstrap {
                bootstrap_indices(n_rows, &mut rng)
            } else {
                (0..n_rows as u32).collect()
            };
            let tree = grower.grow(rows, &mut rng);
            self.log_tree(index, n_trees, &tree);
            tree
        };

        let trees: Vec<RegressionTree> = if self.config.parallel {
            seeds.par_iter().enumerate().map(fit_one).collect()
        } else {
            seeds.iter().enumerate().map(fit_one).collect()
        };

        Forest::from_trees(trees, n_features)
    }

    fn log_tree(&self, index: usize, n_trees: usize, tree: &RegressionTree) {
        match self.config.verbosity {
            Verbosity::Debug => debug!(
                "tree {}/{}: {} nodes, {} leaves, depth {}",
                index + 1,
                n_trees,
                tree.n_nodes(),
                tree.n_leaves(),
                tree.depth()
            ),
            Verbosity::Info => {
                let step = (n_trees / 10).max(1);
                if (index + 1) % step == 0 {
                    info!("fitted tree {}/{}", index + 1, n_trees);
                }
            }
            Verbosity::Silent => {}
        }
    }
}

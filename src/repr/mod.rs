//! Canonical model representations.
//!
//! These types hold fitted trees and are independent of how they were
//! trained or stored.

pub mod forest;
pub mod tree;

pub use forest::{Forest, ForestValidationError};
pub use tree::{MutableTree, NodeId, RegressionTree, TreeParts, TreeValidationError};

//! Seeded train/test split.

use super::sampling::{rng_from_seed, shuffle_in_place};

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Rows used to fit the forest.
    pub train: Vec<usize>,
    /// Rows held out for evaluation.
    pub test: Vec<usize>,
}

/// Number of held-out rows for `n` rows: `ceil(n * test_fraction)` clamped
/// to `[1, n - 1]`. Requires `n >= 2`.
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    debug_assert!(n >= 2);
    let raw = (n as f64 * test_fraction).ceil() as usize;
    raw.clamp(1, n - 1)
}

/// Shuffle `0..n` with `seed` and cut off the held-out rows.
///
/// The first `test_size` shuffled indices form the test set. Both halves
/// are returned in shuffled order.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> TrainTestSplit {
    let mut indices: Vec<usize> = (0..n).collect();
    shuffle_in_place(&mut indices, &mut rng_from_seed(seed));
    let n_test = test_size(n, test_fraction);
    let train = indices.split_off(n_test);
    TrainTestSplit {
        train,
        test: indices,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(2, 0.2, 1)]
    #[case(5, 0.2, 1)]
    #[case(10, 0.2, 2)]
    #[case(11, 0.2, 3)]
    #[case(100, 0.2, 20)]
    #[case(3, 0.9, 2)]
    fn held_out_size(#[case] n: usize, #[case] fraction: f64, #[case] expected: usize) {
        assert_eq!(test_size(n, fraction), expected);
    }

    #[test]
    fn split_is_a_partition() {
        let split = train_test_split(50, 0.2, 42);
        assert_eq!(split.test.len(), 10);
        assert_eq!(split.train.len(), 40);
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_reproducible() {
        assert_eq!(train_test_split(30, 0.2, 9), train_test_split(30, 0.2, 9));
        assert_ne!(train_test_split(30, 0.2, 9), train_test_split(30, 0.2, 10));
    }
}

//! Seeded train/test partition.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of each partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded RNG and hold out `ceil(n * test_fraction)`.
///
/// The same `(n, test_fraction, seed)` always yields the same partition.
/// Both partitions are returned in ascending index order.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> SplitIndices {
    let fraction = test_fraction.clamp(0.0, 1.0);
    let n_test = ((n as f64) * fraction).ceil() as usize;
    let n_test = n_test.min(n);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test = indices[..n_test].to_vec();
    let mut train = indices[n_test..].to_vec();
    test.sort_unstable();
    train.sort_unstable();
    SplitIndices { train, test }
}

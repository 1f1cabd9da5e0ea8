//! Booster Configuration
//!
//! Plain-data descriptions of everything a booster needs at construction,
//! plus the per-round update parameters. The C ABI layer builds these from
//! raw pointers; Rust callers fill them directly.

use crate::dataset::TargetsSource;
use crate::loss::LearningType;

/// Learning rate used when callers have no override.
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
/// Per-leaf sample floor used when callers have no override.
pub const DEFAULT_MIN_SAMPLES_LEAF: u64 = 1;
/// Per-dimension leaf budget used when callers have no override.
pub const DEFAULT_LEAVES_MAX: u64 = 3;

/// One binned input column description.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    /// Bins the column was discretized into. Zero is legal only when the
    /// booster holds no samples at all.
    pub bin_count: usize,
    /// Nominal (unordered) column. Recorded for callers; the boosting core
    /// treats ordinal and nominal bins identically.
    pub categorical: bool,
}

/// One dataset split handed to booster construction.
#[derive(Debug, Clone, Copy)]
pub struct DataSection<'a> {
    pub sample_count: usize,
    /// Feature-major binned values: `binned[feature * samples + sample]`.
    pub binned: &'a [i64],
    pub targets: TargetsSource<'a>,
    /// Row-major warm-start scores, `sample_count * score_width` long.
    pub initial_scores: &'a [f64],
}

/// Everything needed to construct a booster.
#[derive(Debug)]
pub struct BoosterConfig<'a> {
    pub seed: i32,
    pub learning: LearningType,
    pub features: Vec<FeatureSpec>,
    /// Feature groups as ordered lists of feature indices.
    pub groups: Vec<Vec<usize>>,
    /// Bootstrap bags per round; zero boosts on the full training set.
    pub inner_bag_count: usize,
    pub training: DataSection<'a>,
    pub validation: DataSection<'a>,
}

/// OR-combinable per-round option bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions(pub u64);

impl UpdateOptions {
    pub const DEFAULT: UpdateOptions = UpdateOptions(0);
    /// Partition tensors at random cut positions instead of by gain.
    pub const RANDOM_SPLITS: u64 = 1;
    /// Score leaves with raw gradient sums, skipping the hessian division.
    /// Meaningful together with `RANDOM_SPLITS`.
    pub const GRADIENT_SUMS: u64 = 2;

    pub fn random_splits(&self) -> bool {
        self.0 & Self::RANDOM_SPLITS != 0
    }

    pub fn gradient_sums(&self) -> bool {
        self.0 & Self::GRADIENT_SUMS != 0
    }
}

/// Per-round update parameters.
#[derive(Debug, Clone, Copy)]
pub struct UpdateParams<'a> {
    pub options: UpdateOptions,
    /// Shrinkage applied to every leaf score. May be negative or zero; the
    /// engine does not guard against divergence.
    pub learning_rate: f64,
    /// Bag-weighted sample floor for each side of a greedy cut.
    pub min_samples_leaf: u64,
    /// Leaf budget per group dimension, uninformative dimensions included.
    pub leaves_max: &'a [u64],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_bits_compose() {
        let options = UpdateOptions(UpdateOptions::RANDOM_SPLITS | UpdateOptions::GRADIENT_SUMS);
        assert!(options.random_splits());
        assert!(options.gradient_sums());
        assert!(!UpdateOptions::DEFAULT.random_splits());
        assert!(!UpdateOptions::DEFAULT.gradient_sums());
    }
}

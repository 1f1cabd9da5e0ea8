//! Bootstrap Sampling Sets
//!
//! Each inner bag is a bootstrap draw over the training rows, stored as a
//! multiplicity per row. Histogram construction scales every sample's
//! contribution by its multiplicity, and per-round updates are averaged
//! across bags.

use crate::random::RandomStream;

/// Row multiplicities for one inner bag. The counts always sum to the
/// training row count.
#[derive(Debug, Clone)]
pub struct SamplingSet {
    counts: Vec<u64>,
}

impl SamplingSet {
    /// The pseudo-bag containing every row exactly once.
    pub fn full(sample_count: usize) -> Self {
        SamplingSet {
            counts: vec![1; sample_count],
        }
    }

    /// One bootstrap bag: `sample_count` draws with replacement.
    pub fn bootstrap(rng: &mut RandomStream, sample_count: usize) -> Self {
        let mut counts = vec![0u64; sample_count];
        for _ in 0..sample_count {
            counts[rng.next_index(sample_count)] += 1;
        }
        SamplingSet { counts }
    }

    #[inline]
    pub fn count(&self, sample: usize) -> u64 {
        self.counts[sample]
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Generate the booster's sampling sets. Zero bags means standard boosting
/// on the full training set, modeled as a single all-ones pseudo-bag.
pub fn generate_sampling_sets(
    rng: &mut RandomStream,
    sample_count: usize,
    bag_count: usize,
) -> Vec<SamplingSet> {
    if bag_count == 0 {
        return vec![SamplingSet::full(sample_count)];
    }
    (0..bag_count)
        .map(|_| SamplingSet::bootstrap(rng, sample_count))
        .collect()
}

//! Random Tensor Partitions
//!
//! Instead of chasing gain, draw the cut positions: along every significant
//! dimension, pick `leaves_max - 1` distinct interior positions uniformly
//! from the split stream. Leaf scores come from the same region sums the
//! greedy path uses; with gradient-sums enabled the hessian division is
//! skipped. The per-leaf sample floor does not apply to random partitions.

use crate::error::BoostResult;
use crate::histogram::BucketEntry;
use crate::random::RandomStream;
use crate::tensor::SegmentedTensor;

use super::fill_partition;

/// Draw `want` distinct values from `1..bins` by partial Fisher-Yates,
/// returned sorted.
fn draw_cuts(rng: &mut RandomStream, bins: usize, want: usize) -> Vec<usize> {
    let mut candidates: Vec<usize> = (1..bins).collect();
    let want = want.min(candidates.len());
    for slot in 0..want {
        let pick = slot + rng.next_index(candidates.len() - slot);
        candidates.swap(slot, pick);
    }
    candidates.truncate(want);
    candidates.sort_unstable();
    candidates
}

/// Generate a random-partition update for a feature group with any number
/// of significant dimensions and write it, compressed, into `out`.
/// Returns the partition gain.
pub(crate) fn generate_random(
    out: &mut SegmentedTensor,
    bins: &[usize],
    entries: &[BucketEntry],
    width: usize,
    learning_rate: f64,
    leaves_max: &[usize],
    gradient_sums: bool,
    rng: &mut RandomStream,
) -> BoostResult<f64> {
    debug_assert_eq!(bins.len(), leaves_max.len());
    let cuts: Vec<Vec<usize>> = bins
        .iter()
        .zip(leaves_max.iter())
        .map(|(&bin_count, &leaves)| draw_cuts(rng, bin_count, leaves.saturating_sub(1)))
        .collect();
    fill_partition(out, bins, cuts, entries, width, learning_rate, gradient_sums)
}

//! Per-Thread Boosting Scratch
//!
//! A thread state owns everything a round of update generation writes:
//! the accumulated update tensor, the per-bag overwrite tensor, the
//! histogram buffers, and the equivalent-split tie scratch. Thread states
//! are independent of each other; callers may drive one per OS thread
//! against a shared booster, serializing only the apply step.
//!
//! Histogram buffers grow by free-then-reallocate at twice the requested
//! size, so capacity ratchets up to the largest group ever histogrammed
//! and round-to-round work allocates nothing.

use crate::booster::Booster;
use crate::histogram::BucketEntry;
use crate::tensor::SegmentedTensor;

/// Scratch for one boosting thread.
pub struct ThreadState {
    pub(crate) pending_group: Option<usize>,
    /// Update accumulated across bags, expanded to the group's shape.
    pub(crate) accumulated: SegmentedTensor,
    /// Single-bag splitter output, overwritten every bag.
    pub(crate) overwrite: SegmentedTensor,
    pub(crate) hist_counts: Vec<u64>,
    pub(crate) hist_entries: Vec<BucketEntry>,
    /// Equal-gain cut candidates for the single-dimension sweep.
    pub(crate) tie_scratch: Vec<usize>,
}

impl ThreadState {
    /// Scratch sized for the given booster. The tie scratch is reserved
    /// once here, from the booster's worst single-dimension group.
    pub fn new(booster: &Booster) -> ThreadState {
        let width = booster.score_width();
        ThreadState {
            pending_group: None,
            accumulated: SegmentedTensor::new(0, width),
            overwrite: SegmentedTensor::new(0, width),
            hist_counts: Vec::new(),
            hist_entries: Vec::new(),
            tie_scratch: Vec::with_capacity(booster.max_equivalent_splits()),
        }
    }

    /// Make the histogram buffers hold exactly `cells` buckets, zeroed.
    /// Undersized buffers are dropped and replaced at double the request.
    pub(crate) fn ensure_histogram(&mut self, cells: usize, width: usize) {
        if self.hist_counts.capacity() < cells {
            self.hist_counts = Vec::with_capacity(cells * 2);
        }
        self.hist_counts.clear();
        self.hist_counts.resize(cells, 0);

        let entries = cells * width;
        if self.hist_entries.capacity() < entries {
            self.hist_entries = Vec::with_capacity(entries * 2);
        }
        self.hist_entries.clear();
        self.hist_entries.resize(entries, BucketEntry::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_buffers_double_and_then_stick() {
        let mut state = ThreadState {
            pending_group: None,
            accumulated: SegmentedTensor::new(0, 1),
            overwrite: SegmentedTensor::new(0, 1),
            hist_counts: Vec::new(),
            hist_entries: Vec::new(),
            tie_scratch: Vec::new(),
        };
        state.ensure_histogram(10, 2);
        assert_eq!(state.hist_counts.len(), 10);
        assert_eq!(state.hist_entries.len(), 20);
        assert!(20 <= state.hist_counts.capacity());
        let capacity = state.hist_counts.capacity();
        state.ensure_histogram(4, 2);
        assert_eq!(state.hist_counts.len(), 4);
        assert_eq!(state.hist_counts.capacity(), capacity);
    }

    #[test]
    fn buffers_are_zeroed_between_uses() {
        let mut state = ThreadState {
            pending_group: None,
            accumulated: SegmentedTensor::new(0, 1),
            overwrite: SegmentedTensor::new(0, 1),
            hist_counts: Vec::new(),
            hist_entries: Vec::new(),
            tie_scratch: Vec::new(),
        };
        state.ensure_histogram(3, 1);
        state.hist_counts[1] = 7;
        state.hist_entries[2].sum_residual = 5.0;
        state.ensure_histogram(3, 1);
        assert_eq!(state.hist_counts, vec![0, 0, 0]);
        assert_eq!(state.hist_entries[2], BucketEntry::default());
    }
}

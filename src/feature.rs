//! Features and Feature Groups
//!
//! A feature is a binned input column. A feature group is the ordered tuple
//! of features over which one additive component of the model is defined;
//! its tensor has one cell per combination of significant bins. Groups also
//! carry the bit-pack geometry used by the datasets: every sample's cell
//! code for a group is packed into 64-bit words at construction time and
//! never rewritten.

use crate::error::{BoostError, BoostResult};

/// Hard cap on significant dimensions per feature group.
pub const MAX_DIMENSIONS: usize = 64;

/// Bits per packed storage word.
pub(crate) const STORAGE_WORD_BITS: usize = 64;

/// Number of bits needed to represent values in `[0, max_value]`.
pub(crate) fn bits_required(max_value: u64) -> usize {
    debug_assert!(0 < max_value);
    STORAGE_WORD_BITS - max_value.leading_zeros() as usize
}

/// One binned input column.
#[derive(Debug, Clone)]
pub struct Feature {
    bin_count: usize,
    index: usize,
    categorical: bool,
}

impl Feature {
    pub fn new(bin_count: usize, index: usize, categorical: bool) -> Self {
        Feature {
            bin_count,
            index,
            categorical,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_categorical(&self) -> bool {
        self.categorical
    }

    /// A feature contributes a tensor dimension only when it can vary.
    /// Zero- and one-bin features are dropped from the tensor entirely.
    pub fn is_significant(&self) -> bool {
        1 < self.bin_count
    }
}

/// An ordered tuple of features defining one additive model component.
#[derive(Debug, Clone)]
pub struct FeatureGroup {
    index: usize,
    feature_indices: Vec<usize>,
    bin_counts: Vec<usize>,
    significant_count: usize,
    tensor_bins: usize,
    items_per_packed_word: usize,
}

impl FeatureGroup {
    /// Build a group from feature indices, validating each against the
    /// feature table and deriving the tensor and bit-pack geometry.
    pub fn new(
        index: usize,
        feature_indices: Vec<usize>,
        features: &[Feature],
    ) -> BoostResult<Self> {
        let mut bin_counts = Vec::with_capacity(feature_indices.len());
        let mut significant_count = 0usize;
        let mut tensor_bins = 1usize;
        for &feature_index in &feature_indices {
            let feature = features.get(feature_index).ok_or(
                BoostError::FeatureIndexOutOfRange {
                    index: feature_index,
                    count: features.len(),
                },
            )?;
            let bins = feature.bin_count();
            bin_counts.push(bins);
            if feature.is_significant() {
                significant_count += 1;
                tensor_bins = tensor_bins
                    .checked_mul(bins)
                    .ok_or(BoostError::TensorTooLarge)?;
            }
        }
        if MAX_DIMENSIONS < significant_count {
            return Err(BoostError::TooManyDimensions {
                count: significant_count,
                max: MAX_DIMENSIONS,
            });
        }
        let items_per_packed_word = if 0 < significant_count {
            STORAGE_WORD_BITS / bits_required(tensor_bins as u64 - 1)
        } else {
            0
        };
        Ok(FeatureGroup {
            index,
            feature_indices,
            bin_counts,
            significant_count,
            tensor_bins,
            items_per_packed_word,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of features in the group, significant or not.
    pub fn dimension_count(&self) -> usize {
        self.feature_indices.len()
    }

    /// Number of dimensions with more than one bin.
    pub fn significant_count(&self) -> usize {
        self.significant_count
    }

    /// Product of significant bin counts; 1 for a constant-cell group.
    pub fn tensor_bins(&self) -> usize {
        self.tensor_bins
    }

    /// Samples packed into each storage word; 0 when nothing is packed.
    pub fn items_per_packed_word(&self) -> usize {
        self.items_per_packed_word
    }

    /// Bits per packed cell code.
    pub(crate) fn packed_item_bits(&self) -> usize {
        debug_assert!(0 < self.significant_count);
        bits_required(self.tensor_bins as u64 - 1)
    }

    pub fn feature_indices(&self) -> &[usize] {
        &self.feature_indices
    }

    /// Bin count of the feature at the given group dimension.
    pub fn bin_count(&self, dimension: usize) -> usize {
        self.bin_counts[dimension]
    }

    /// Bin counts of the significant dimensions, in group order.
    pub fn significant_bin_counts(&self) -> Vec<usize> {
        self.bin_counts.iter().copied().filter(|&b| 1 < b).collect()
    }

    /// Ordinal of a full dimension among the significant dimensions, or
    /// `None` when the dimension is uninformative.
    pub fn significant_ordinal(&self, dimension: usize) -> Option<usize> {
        if self.bin_counts[dimension] <= 1 {
            return None;
        }
        Some(
            self.bin_counts[..dimension]
                .iter()
                .filter(|&&b| 1 < b)
                .count(),
        )
    }

    /// Product of every dimension's bin count, `None` on overflow. This is
    /// the length contract of the public model getters; a zero-bin
    /// dimension collapses it to zero.
    pub fn full_cell_count(&self) -> Option<usize> {
        let mut cells = 1usize;
        for &bins in &self.bin_counts {
            cells = cells.checked_mul(bins)?;
        }
        Some(cells)
    }

    /// Interior split positions available along the single significant
    /// dimension; used to size the equivalent-split scratch.
    pub fn equivalent_split_candidates(&self) -> usize {
        if self.significant_count == 1 {
            self.tensor_bins - 1
        } else {
            0
        }
    }
}

//! Segmented Tensors
//!
//! A segmented tensor is a piecewise-constant function over an N-dimensional
//! hyper-rectangle of bins: each dimension carries an ordered list of split
//! positions, and a flat row-major value array holds `width` scores per
//! cell, dimension 0 varying fastest.
//!
//! Two forms exist. Splitter output is compressed (few splits, few cells).
//! Models stored on the booster are always expanded: every interior bin
//! boundary is a split, so cell lookup is direct indexing. Expansion is the
//! bridge between the two and is idempotent.

use crate::error::{BoostError, BoostResult};

/// A variable-resolution additive tensor.
#[derive(Debug, Clone)]
pub struct SegmentedTensor {
    dimensions: usize,
    splits: Vec<Vec<usize>>,
    values: Vec<f64>,
    width: usize,
    expanded: bool,
}

impl SegmentedTensor {
    /// A zero-dimensional tensor holding one zeroed cell of `width` scores.
    pub fn new(dimensions: usize, width: usize) -> Self {
        debug_assert!(0 < width);
        SegmentedTensor {
            dimensions,
            splits: vec![Vec::new(); dimensions],
            values: vec![0.0; width],
            width,
            expanded: false,
        }
    }

    /// Re-dimension to a single unsplit cell, dropping previous content.
    pub fn reset(&mut self, dimensions: usize) {
        self.dimensions = dimensions;
        self.splits.clear();
        self.splits.resize(dimensions, Vec::new());
        self.values.clear();
        self.values.resize(self.width, 0.0);
        self.expanded = false;
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn splits(&self, dimension: usize) -> &[usize] {
        &self.splits[dimension]
    }

    /// Segments along each dimension (`splits + 1`).
    pub fn segment_counts(&self) -> Vec<usize> {
        self.splits.iter().map(|s| s.len() + 1).collect()
    }

    /// Total cell count across all dimensions.
    pub fn cell_count(&self) -> usize {
        self.splits.iter().map(|s| s.len() + 1).product()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Install a full partition (cuts per dimension) and zero the value
    /// array to the implied cell count. Cuts must be sorted and interior.
    pub fn set_partition(&mut self, cuts_per_dimension: Vec<Vec<usize>>) -> BoostResult<()> {
        debug_assert_eq!(cuts_per_dimension.len(), self.dimensions);
        let mut cells = 1usize;
        for cuts in &cuts_per_dimension {
            debug_assert!(cuts.windows(2).all(|w| w[0] < w[1]));
            cells = cells
                .checked_mul(cuts.len() + 1)
                .ok_or(BoostError::TensorTooLarge)?;
        }
        let total = cells
            .checked_mul(self.width)
            .ok_or(BoostError::TensorTooLarge)?;
        self.splits = cuts_per_dimension;
        self.values.clear();
        self.values.resize(total, 0.0);
        self.expanded = false;
        Ok(())
    }

    fn cell_offset(&self, coordinates: &[usize]) -> usize {
        debug_assert_eq!(coordinates.len(), self.dimensions);
        let mut offset = 0usize;
        let mut stride = 1usize;
        for (dimension, &coordinate) in coordinates.iter().enumerate() {
            let segments = self.splits[dimension].len() + 1;
            debug_assert!(coordinate < segments);
            offset += coordinate * stride;
            stride *= segments;
        }
        offset
    }

    /// Scores of one cell addressed by per-dimension segment coordinates.
    pub fn cell(&self, coordinates: &[usize]) -> &[f64] {
        let offset = self.cell_offset(coordinates) * self.width;
        &self.values[offset..offset + self.width]
    }

    pub fn cell_mut(&mut self, coordinates: &[usize]) -> &mut [f64] {
        let offset = self.cell_offset(coordinates) * self.width;
        let width = self.width;
        &mut self.values[offset..offset + width]
    }

    /// Inflate to one segment per bin along every dimension, broadcasting
    /// existing segment values to the bins they cover. Idempotent. Fails
    /// only when the expanded value array would overflow.
    pub fn expand(&mut self, bin_counts: &[usize]) -> BoostResult<()> {
        debug_assert_eq!(bin_counts.len(), self.dimensions);
        let mut cells = 1usize;
        for &bins in bin_counts {
            debug_assert!(0 < bins);
            cells = cells.checked_mul(bins).ok_or(BoostError::TensorTooLarge)?;
        }
        let total = cells
            .checked_mul(self.width)
            .ok_or(BoostError::TensorTooLarge)?;
        if self.expanded {
            debug_assert_eq!(self.values.len(), total);
            return Ok(());
        }

        let mut expanded_values = vec![0.0; total];
        let mut coordinates = vec![0usize; self.dimensions];
        for cell in 0..cells {
            let mut remainder = cell;
            for (dimension, &bins) in bin_counts.iter().enumerate() {
                coordinates[dimension] = remainder % bins;
                remainder /= bins;
            }
            let mut source_offset = 0usize;
            let mut stride = 1usize;
            for (dimension, &bin) in coordinates.iter().enumerate() {
                let splits = &self.splits[dimension];
                let segment = splits.partition_point(|&split| split <= bin);
                source_offset += segment * stride;
                stride *= splits.len() + 1;
            }
            let source = source_offset * self.width;
            let target = cell * self.width;
            expanded_values[target..target + self.width]
                .copy_from_slice(&self.values[source..source + self.width]);
        }

        for (dimension, &bins) in bin_counts.iter().enumerate() {
            self.splits[dimension] = (1..bins).collect();
        }
        self.values = expanded_values;
        self.expanded = true;
        Ok(())
    }

    /// Element-wise add of another expanded tensor of identical shape.
    pub fn add_expanded(&mut self, other: &SegmentedTensor) -> BoostResult<()> {
        if !self.expanded
            || !other.expanded
            || self.values.len() != other.values.len()
            || self.dimensions != other.dimensions
        {
            return Err(BoostError::ShapeMismatch {
                expected: self.values.len(),
                actual: other.values.len(),
            });
        }
        for (target, &source) in self.values.iter_mut().zip(other.values.iter()) {
            *target += source;
        }
        Ok(())
    }

    /// Become a copy of another tensor of the same width.
    pub fn copy_from(&mut self, other: &SegmentedTensor) {
        debug_assert_eq!(self.width, other.width);
        self.dimensions = other.dimensions;
        self.splits.clone_from(&other.splits);
        self.values.clone_from(&other.values);
        self.expanded = other.expanded;
    }

    /// Multiply every value by a constant.
    pub fn scale(&mut self, factor: f64) {
        for value in &mut self.values {
            *value *= factor;
        }
    }
}

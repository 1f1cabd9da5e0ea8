//! Residual Histograms
//!
//! One pass over the training rows scatters bag-weighted residual and
//! hessian sums into the cells of a feature group's tensor, addressed by
//! each sample's packed cell code. Splitters only ever look at these
//! aggregates, never at raw rows.

use crate::dataset::Dataset;
use crate::loss::{self, LearningType};
use crate::sampling::SamplingSet;

/// Per-cell, per-class accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BucketEntry {
    pub sum_residual: f64,
    pub sum_hessian: f64,
}

impl BucketEntry {
    /// Splitting score contribution `sum_res^2 / sum_hess`; empty cells
    /// contribute nothing.
    #[inline]
    pub fn score(&self) -> f64 {
        if self.sum_hessian == 0.0 {
            0.0
        } else {
            self.sum_residual * self.sum_residual / self.sum_hessian
        }
    }

    #[inline]
    pub fn accumulate(&mut self, other: &BucketEntry) {
        self.sum_residual += other.sum_residual;
        self.sum_hessian += other.sum_hessian;
    }
}

/// Fill `counts` (len = cells) and `entries` (len = cells * width) with the
/// bag-weighted sums for one feature group. Classification recovers each
/// sample's per-class hessian from its residual; regression uses the bag
/// multiplicity itself so the Newton step divides by the sample count.
pub fn build_histogram(
    task: LearningType,
    dataset: &Dataset,
    group: usize,
    bag: &SamplingSet,
    counts: &mut [u64],
    entries: &mut [BucketEntry],
) {
    let width = dataset.width();
    debug_assert_eq!(entries.len(), counts.len() * width);
    counts.fill(0);
    entries.fill(BucketEntry::default());

    let residuals = dataset.residuals();
    let classification = task.is_classification();
    for (sample, cell) in dataset.cell_codes(group).enumerate() {
        let multiplicity = bag.count(sample);
        if multiplicity == 0 {
            continue;
        }
        counts[cell] += multiplicity;
        let weight = multiplicity as f64;
        let sample_base = sample * width;
        let cell_base = cell * width;
        for class in 0..width {
            let residual = residuals[sample_base + class];
            let entry = &mut entries[cell_base + class];
            entry.sum_residual += residual * weight;
            entry.sum_hessian += if classification {
                loss::hessian_from_residual(residual) * weight
            } else {
                weight
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TargetsSource;
    use crate::feature::{Feature, FeatureGroup};

    #[test]
    fn regression_histogram_sums_residuals_and_counts() {
        let features = vec![Feature::new(2, 0, false)];
        let groups = vec![FeatureGroup::new(0, vec![0], &features).unwrap()];
        let binned = [0i64, 1, 1, 0];
        let targets = [1.0, 2.0, 4.0, 3.0];
        let scores = [0.0; 4];
        let dataset = Dataset::new(
            LearningType::Regression,
            &features,
            &groups,
            4,
            &binned,
            TargetsSource::Regression(&targets),
            &scores,
            true,
        )
        .unwrap();
        let bag = SamplingSet::full(4);
        let mut counts = vec![0u64; 2];
        let mut entries = vec![BucketEntry::default(); 2];
        build_histogram(
            LearningType::Regression,
            &dataset,
            0,
            &bag,
            &mut counts,
            &mut entries,
        );
        assert_eq!(counts, vec![2, 2]);
        assert_eq!(entries[0].sum_residual, 4.0);
        assert_eq!(entries[0].sum_hessian, 2.0);
        assert_eq!(entries[1].sum_residual, 6.0);
        assert_eq!(entries[1].sum_hessian, 2.0);
    }

    #[test]
    fn rebuilding_overwrites_previous_sums() {
        let features = vec![Feature::new(2, 0, false)];
        let groups = vec![FeatureGroup::new(0, vec![0], &features).unwrap()];
        let binned = [0i64, 1];
        let targets = [5.0, 7.0];
        let scores = [0.0; 2];
        let dataset = Dataset::new(
            LearningType::Regression,
            &features,
            &groups,
            2,
            &binned,
            TargetsSource::Regression(&targets),
            &scores,
            true,
        )
        .unwrap();
        let bag = SamplingSet::full(2);
        let mut counts = vec![9u64; 2];
        let mut entries = vec![
            BucketEntry {
                sum_residual: 99.0,
                sum_hessian: 99.0,
            };
            2
        ];
        build_histogram(
            LearningType::Regression,
            &dataset,
            0,
            &bag,
            &mut counts,
            &mut entries,
        );
        assert_eq!(counts, vec![1, 1]);
        assert_eq!(entries[0].sum_residual, 5.0);
        assert_eq!(entries[1].sum_residual, 7.0);
    }

    #[test]
    fn classification_hessians_follow_probabilities() {
        let features = vec![Feature::new(2, 0, false)];
        let groups = vec![FeatureGroup::new(0, vec![0], &features).unwrap()];
        let binned = [0i64];
        let targets = [1i64];
        let scores = [0.0];
        let dataset = Dataset::new(
            LearningType::Classification { classes: 2 },
            &features,
            &groups,
            1,
            &binned,
            TargetsSource::Classification(&targets),
            &scores,
            true,
        )
        .unwrap();
        let bag = SamplingSet::full(1);
        let mut counts = vec![0u64; 2];
        let mut entries = vec![BucketEntry::default(); 2];
        build_histogram(
            LearningType::Classification { classes: 2 },
            &dataset,
            0,
            &bag,
            &mut counts,
            &mut entries,
        );
        // p = 0.5 at score 0: residual 0.5, hessian 0.25.
        assert!((entries[0].sum_residual - 0.5).abs() < 1e-12);
        assert!((entries[0].sum_hessian - 0.25).abs() < 1e-12);
        assert_eq!(entries[1], BucketEntry::default());
    }
}

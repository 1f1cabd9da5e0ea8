//! Boosting Datasets
//!
//! A dataset owns the targets, the current predictor scores, the residuals,
//! and one bit-packed cell-code column per feature group. Raw binned input
//! arrives feature-major (`binned[feature * samples + sample]`); at
//! construction each sample's bin combination is folded into a single cell
//! code per group and packed low-bits-first into 64-bit words. The packed
//! columns never change afterwards; scores and residuals mutate in place
//! every round.
//!
//! Classification validation sets skip the residual buffer: their metric is
//! computed straight from scores and targets.

use crate::error::{BoostError, BoostResult};
use crate::feature::{Feature, FeatureGroup};
use crate::loss::{self, LearningType};
use crate::tensor::SegmentedTensor;

/// Borrowed target column handed to dataset construction.
#[derive(Debug, Clone, Copy)]
pub enum TargetsSource<'a> {
    Regression(&'a [f64]),
    Classification(&'a [i64]),
}

#[derive(Debug)]
enum Targets {
    Regression(Vec<f64>),
    Classification(Vec<usize>),
}

/// One feature group's packed cell codes.
#[derive(Debug)]
struct PackedColumn {
    words: Vec<u64>,
    item_bits: usize,
    items_per_word: usize,
}

/// Training or validation sample storage.
#[derive(Debug)]
pub struct Dataset {
    sample_count: usize,
    width: usize,
    targets: Targets,
    scores: Vec<f64>,
    residuals: Vec<f64>,
    packed: Vec<PackedColumn>,
}

impl Dataset {
    /// Build a dataset: validate and pack the binned data, copy targets and
    /// warm-start scores, and (when requested) initialize residuals from
    /// those scores.
    pub fn new(
        task: LearningType,
        features: &[Feature],
        groups: &[FeatureGroup],
        sample_count: usize,
        binned: &[i64],
        targets: TargetsSource<'_>,
        initial_scores: &[f64],
        allocate_residuals: bool,
    ) -> BoostResult<Dataset> {
        let width = task.score_width();
        if binned.len() != features.len() * sample_count {
            return Err(BoostError::InvalidArgument("binned data length"));
        }
        if initial_scores.len() != sample_count * width {
            return Err(BoostError::InvalidArgument("initial scores length"));
        }

        let targets = match (task, targets) {
            (LearningType::Regression, TargetsSource::Regression(raw)) => {
                if raw.len() != sample_count {
                    return Err(BoostError::InvalidArgument("target length"));
                }
                Targets::Regression(raw.to_vec())
            }
            (LearningType::Classification { classes }, TargetsSource::Classification(raw)) => {
                if raw.len() != sample_count {
                    return Err(BoostError::InvalidArgument("target length"));
                }
                let mut converted = Vec::with_capacity(sample_count);
                for (sample, &target) in raw.iter().enumerate() {
                    if target < 0 || classes as i64 <= target {
                        return Err(BoostError::TargetOutOfRange { sample });
                    }
                    converted.push(target as usize);
                }
                Targets::Classification(converted)
            }
            _ => return Err(BoostError::InvalidArgument("target kind")),
        };

        let mut packed = Vec::with_capacity(groups.len());
        for group in groups {
            packed.push(Self::pack_group(group, features, sample_count, binned)?);
        }

        let scores = initial_scores.to_vec();
        let mut dataset = Dataset {
            sample_count,
            width,
            targets,
            scores,
            residuals: Vec::new(),
            packed,
        };
        if allocate_residuals {
            dataset.residuals = vec![0.0; sample_count * width];
            dataset.initialize_residuals(task);
        }
        Ok(dataset)
    }

    fn pack_group(
        group: &FeatureGroup,
        features: &[Feature],
        sample_count: usize,
        binned: &[i64],
    ) -> BoostResult<PackedColumn> {
        if group.significant_count() == 0 {
            return Ok(PackedColumn {
                words: Vec::new(),
                item_bits: 0,
                items_per_word: 0,
            });
        }
        let item_bits = group.packed_item_bits();
        let items_per_word = group.items_per_packed_word();
        let word_count = sample_count.div_ceil(items_per_word);
        let mut words = vec![0u64; word_count];
        for sample in 0..sample_count {
            let mut cell = 0usize;
            let mut stride = 1usize;
            for &feature_index in group.feature_indices() {
                let bins = features[feature_index].bin_count();
                let value = binned[feature_index * sample_count + sample];
                if value < 0 || bins as i64 <= value {
                    return Err(BoostError::BinOutOfRange {
                        feature: feature_index,
                        sample,
                    });
                }
                if 1 < bins {
                    cell += value as usize * stride;
                    stride *= bins;
                }
            }
            let shift = (sample % items_per_word) * item_bits;
            words[sample / items_per_word] |= (cell as u64) << shift;
        }
        Ok(PackedColumn {
            words,
            item_bits,
            items_per_word,
        })
    }

    fn initialize_residuals(&mut self, task: LearningType) {
        let width = self.width;
        match (&self.targets, task) {
            (Targets::Regression(targets), LearningType::Regression) => {
                for i in 0..self.sample_count {
                    self.residuals[i] = targets[i] - self.scores[i];
                }
            }
            (Targets::Classification(targets), LearningType::Classification { classes }) => {
                if classes < 2 {
                    // Single-class data is always predicted perfectly.
                    return;
                }
                if classes == 2 {
                    for i in 0..self.sample_count {
                        self.residuals[i] = loss::binary_residual(self.scores[i], targets[i]);
                    }
                } else {
                    for i in 0..self.sample_count {
                        let base = i * width;
                        loss::multiclass_residuals(
                            &self.scores[base..base + width],
                            targets[i],
                            &mut self.residuals[base..base + width],
                        );
                    }
                }
            }
            _ => unreachable!("target kind checked at construction"),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    fn column_codes(column: &PackedColumn, sample_count: usize) -> CellCodes<'_> {
        CellCodes {
            words: &column.words,
            item_bits: column.item_bits,
            items_per_word: column.items_per_word,
            mask: if column.items_per_word == 0 {
                0
            } else {
                u64::MAX >> (64 - column.item_bits)
            },
            remaining: sample_count,
            current_word: 0,
            items_left: 0,
            next_word: 0,
        }
    }

    /// Iterate every sample's cell code for one feature group.
    pub(crate) fn cell_codes(&self, group: usize) -> CellCodes<'_> {
        Self::column_codes(&self.packed[group], self.sample_count)
    }

    /// Add an expanded update tensor into every sample's scores for the
    /// given group, refreshing residuals where they are kept.
    pub(crate) fn apply_update_scores(
        &mut self,
        task: LearningType,
        group: usize,
        update: &SegmentedTensor,
    ) {
        let width = self.width;
        let codes = Self::column_codes(&self.packed[group], self.sample_count);
        let values = update.values();
        let track_residuals = !self.residuals.is_empty();
        match (&self.targets, task) {
            (Targets::Regression(_), LearningType::Regression) => {
                for (i, cell) in codes.enumerate() {
                    let delta = values[cell];
                    self.scores[i] += delta;
                    if track_residuals {
                        self.residuals[i] -= delta;
                    }
                }
            }
            (Targets::Classification(targets), LearningType::Classification { classes }) => {
                if classes == 2 {
                    for (i, cell) in codes.enumerate() {
                        self.scores[i] += values[cell];
                        if track_residuals {
                            self.residuals[i] =
                                loss::binary_residual(self.scores[i], targets[i]);
                        }
                    }
                } else {
                    for (i, cell) in codes.enumerate() {
                        let score_base = i * width;
                        let value_base = cell * width;
                        for k in 0..width {
                            self.scores[score_base + k] += values[value_base + k];
                        }
                        if track_residuals {
                            loss::multiclass_residuals(
                                &self.scores[score_base..score_base + width],
                                targets[i],
                                &mut self.residuals[score_base..score_base + width],
                            );
                        }
                    }
                }
            }
            _ => unreachable!("target kind checked at construction"),
        }
    }

    /// Mean per-sample loss over this dataset; 0 when it is empty.
    pub(crate) fn mean_loss(&self, task: LearningType) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        let width = self.width;
        let total: f64 = match (&self.targets, task) {
            (Targets::Regression(_), LearningType::Regression) => {
                self.residuals.iter().map(|r| r * r).sum()
            }
            (Targets::Classification(targets), LearningType::Classification { classes }) => {
                if classes == 2 {
                    (0..self.sample_count)
                        .map(|i| loss::binary_log_loss(self.scores[i], targets[i]))
                        .sum()
                } else {
                    (0..self.sample_count)
                        .map(|i| {
                            let base = i * width;
                            loss::multiclass_log_loss(
                                &self.scores[base..base + width],
                                targets[i],
                            )
                        })
                        .sum()
                }
            }
            _ => unreachable!("target kind checked at construction"),
        };
        total / self.sample_count as f64
    }
}

/// Decoder over one packed column, low bits first within each word.
pub(crate) struct CellCodes<'a> {
    words: &'a [u64],
    item_bits: usize,
    items_per_word: usize,
    mask: u64,
    remaining: usize,
    current_word: u64,
    items_left: usize,
    next_word: usize,
}

impl Iterator for CellCodes<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.items_per_word == 0 {
            // Constant-cell group: every sample lands in cell 0.
            return Some(0);
        }
        if self.items_left == 0 {
            self.current_word = self.words[self.next_word];
            self.next_word += 1;
            self.items_left = self.items_per_word;
        }
        let code = (self.current_word & self.mask) as usize;
        self.current_word = if self.item_bits < 64 {
            self.current_word >> self.item_bits
        } else {
            0
        };
        self.items_left -= 1;
        Some(code)
    }
}

//! The Booster
//!
//! Owns all training state: feature and group tables, the bit-packed
//! training and validation sets, the bootstrap bags, both deterministic
//! random streams, and the current and best additive models (one expanded
//! segmented tensor per feature group).
//!
//! A round is two calls against a [`ThreadState`]: `generate_update`
//! produces a candidate update for one group into the thread's scratch,
//! and `apply_update` folds it into the model, refreshes scores and
//! residuals, and scores the validation set. Distinct thread states may
//! generate concurrently (the booster is only read, and the shared split
//! stream sits behind a mutex); applies mutate the booster and therefore
//! take `&mut self` — the C ABI documents the same serialization
//! requirement instead of enforcing it.

use log::{error, trace};
use parking_lot::Mutex;

use crate::config::{BoosterConfig, UpdateParams};
use crate::dataset::Dataset;
use crate::error::{BoostError, BoostResult};
use crate::feature::{Feature, FeatureGroup};
use crate::histogram::build_histogram;
use crate::loss::LearningType;
use crate::random::{RandomStream, StreamPurpose};
use crate::sampling::{generate_sampling_sets, SamplingSet};
use crate::splitter::{generate_random, grow_greedy};
use crate::tensor::SegmentedTensor;
use crate::thread_state::ThreadState;

/// Gradient-boosting engine state for one model.
pub struct Booster {
    task: LearningType,
    features: Vec<Feature>,
    groups: Vec<FeatureGroup>,
    training: Dataset,
    validation: Dataset,
    bags: Vec<SamplingSet>,
    split_stream: Mutex<RandomStream>,
    current_model: Vec<SegmentedTensor>,
    best_model: Vec<SegmentedTensor>,
    best_metric: f64,
    max_equivalent_splits: usize,
}

impl Booster {
    /// Validate the configuration and build a fully-initialized booster.
    /// Nothing is left half-constructed on error.
    pub fn new(config: BoosterConfig<'_>) -> BoostResult<Booster> {
        trace!("entered Booster::new");
        let task = config.learning;
        let any_samples =
            0 < config.training.sample_count || 0 < config.validation.sample_count;
        if let LearningType::Classification { classes } = task {
            if classes == 0 && any_samples {
                error!("Booster::new zero classes with samples present");
                return Err(BoostError::InvalidArgument(
                    "zero target classes with samples present",
                ));
            }
        }

        let mut features = Vec::with_capacity(config.features.len());
        for (index, spec) in config.features.iter().enumerate() {
            if spec.bin_count == 0 && any_samples {
                error!("Booster::new zero-bin feature {} with samples present", index);
                return Err(BoostError::InvalidArgument(
                    "zero-bin feature with samples present",
                ));
            }
            features.push(Feature::new(spec.bin_count, index, spec.categorical));
        }

        let mut groups = Vec::with_capacity(config.groups.len());
        let mut max_equivalent_splits = 0usize;
        for (index, member_indices) in config.groups.iter().enumerate() {
            let group = FeatureGroup::new(index, member_indices.clone(), &features)?;
            max_equivalent_splits = max_equivalent_splits.max(group.equivalent_split_candidates());
            groups.push(group);
        }

        let training = Dataset::new(
            task,
            &features,
            &groups,
            config.training.sample_count,
            config.training.binned,
            config.training.targets,
            config.training.initial_scores,
            true,
        )?;
        // Classification validation loss reads scores and targets directly;
        // only regression keeps validation residuals.
        let validation = Dataset::new(
            task,
            &features,
            &groups,
            config.validation.sample_count,
            config.validation.binned,
            config.validation.targets,
            config.validation.initial_scores,
            !task.is_classification(),
        )?;

        let width = task.score_width();
        let mut current_model = Vec::new();
        let mut best_model = Vec::new();
        if task.has_model() {
            for group in &groups {
                let bins = group.significant_bin_counts();
                let mut current = SegmentedTensor::new(bins.len(), width);
                current.expand(&bins)?;
                let mut best = SegmentedTensor::new(bins.len(), width);
                best.expand(&bins)?;
                current_model.push(current);
                best_model.push(best);
            }
        }

        let bags = if 0 < config.training.sample_count {
            let mut sampling_stream = RandomStream::new(config.seed, StreamPurpose::Sampling);
            generate_sampling_sets(
                &mut sampling_stream,
                config.training.sample_count,
                config.inner_bag_count,
            )
        } else {
            Vec::new()
        };

        trace!("exited Booster::new");
        Ok(Booster {
            task,
            features,
            groups,
            training,
            validation,
            bags,
            split_stream: Mutex::new(RandomStream::new(config.seed, StreamPurpose::Splitting)),
            current_model,
            best_model,
            best_metric: f64::INFINITY,
            max_equivalent_splits,
        })
    }

    pub fn task(&self) -> LearningType {
        self.task
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Dimensionality (feature count) of one group.
    pub fn group_dimension_count(&self, group_index: usize) -> BoostResult<usize> {
        self.group(group_index).map(FeatureGroup::dimension_count)
    }

    /// Public model-value count of one group: `score_width` times the
    /// product of every dimension's bin count, uninformative dimensions
    /// included. A zero-bin dimension collapses it to zero.
    pub fn model_value_count(&self, group_index: usize) -> BoostResult<usize> {
        let group = self.group(group_index)?;
        let cells = group.full_cell_count().ok_or(BoostError::TensorTooLarge)?;
        cells
            .checked_mul(self.task.score_width())
            .ok_or(BoostError::TensorTooLarge)
    }

    fn group(&self, group_index: usize) -> BoostResult<&FeatureGroup> {
        self.groups.get(group_index).ok_or(BoostError::GroupIndexOutOfRange {
            index: group_index,
            count: self.groups.len(),
        })
    }

    pub(crate) fn score_width(&self) -> usize {
        self.task.score_width()
    }

    pub(crate) fn max_equivalent_splits(&self) -> usize {
        self.max_equivalent_splits
    }

    /// Lowest validation metric seen so far; infinite before any apply.
    pub fn best_metric(&self) -> f64 {
        self.best_metric
    }

    // ========================================================================
    // Round pipeline
    // ========================================================================

    /// Build a candidate update for one feature group into the thread
    /// state's accumulated tensor and return its gain.
    ///
    /// Per bag: histogram the training rows, run the configured splitter,
    /// and fold the bag's update into the accumulator; the result and the
    /// gain are averaged over bags. With no training rows the update is
    /// all zeros. Degenerate classification records the pending group and
    /// reports zero gain.
    pub fn generate_update(
        &self,
        state: &mut ThreadState,
        group_index: usize,
        params: &UpdateParams<'_>,
    ) -> BoostResult<f64> {
        trace!("entered generate_update for group {}", group_index);
        let group = self.group(group_index)?;
        state.pending_group = Some(group_index);
        if !self.task.has_model() {
            state.accumulated.reset(0);
            state.accumulated.expand(&[])?;
            return Ok(0.0);
        }
        if params.leaves_max.len() < group.dimension_count() {
            error!("generate_update leaves_max shorter than group dimensionality");
            return Err(BoostError::InvalidArgument("leaves_max length"));
        }

        let width = self.score_width();
        let bins = group.significant_bin_counts();
        let mut leaves = Vec::with_capacity(bins.len());
        for dimension in 0..group.dimension_count() {
            if 1 < group.bin_count(dimension) {
                leaves.push((params.leaves_max[dimension].max(1)) as usize);
            }
        }

        state.accumulated.reset(bins.len());
        state.accumulated.expand(&bins)?;
        if self.training.sample_count() == 0 || self.bags.is_empty() {
            return Ok(0.0);
        }

        let cells = group.tensor_bins();
        let mut total_gain = 0.0;
        let mut split_stream = self.split_stream.lock();
        for bag in &self.bags {
            state.ensure_histogram(cells, width);
            build_histogram(
                self.task,
                &self.training,
                group_index,
                bag,
                &mut state.hist_counts,
                &mut state.hist_entries,
            );
            let gain = if params.options.random_splits() {
                generate_random(
                    &mut state.overwrite,
                    &bins,
                    &state.hist_entries,
                    width,
                    params.learning_rate,
                    &leaves,
                    params.options.gradient_sums(),
                    &mut split_stream,
                )?
            } else {
                grow_greedy(
                    &mut state.overwrite,
                    &bins,
                    &state.hist_counts,
                    &state.hist_entries,
                    width,
                    params.learning_rate,
                    params.min_samples_leaf,
                    &leaves,
                    &mut state.tie_scratch,
                    &mut split_stream,
                )?
            };
            state.overwrite.expand(&bins)?;
            state.accumulated.add_expanded(&state.overwrite)?;
            total_gain += gain;
        }

        let scale = 1.0 / self.bags.len() as f64;
        state.accumulated.scale(scale);
        trace!("exited generate_update");
        Ok(total_gain * scale)
    }

    /// Fold the pending update into the current model, refresh training
    /// scores and residuals, rescore validation, and promote the best
    /// model on strict improvement. Returns the validation metric (0 with
    /// no validation rows, in which case the best model never moves).
    pub fn apply_update(&mut self, state: &ThreadState) -> BoostResult<f64> {
        let group_index = state.pending_group.ok_or(BoostError::NoPendingUpdate)?;
        trace!("entered apply_update for group {}", group_index);
        self.group(group_index)?;
        if !self.task.has_model() {
            return Ok(0.0);
        }

        self.current_model[group_index].add_expanded(&state.accumulated)?;
        self.training
            .apply_update_scores(self.task, group_index, &state.accumulated);
        self.validation
            .apply_update_scores(self.task, group_index, &state.accumulated);

        if self.validation.sample_count() == 0 {
            return Ok(0.0);
        }
        let metric = self.validation.mean_loss(self.task);
        if metric < self.best_metric {
            self.best_metric = metric;
            for (best, current) in self.best_model.iter_mut().zip(self.current_model.iter()) {
                best.copy_from(current);
            }
        }
        trace!("exited apply_update, metric {}", metric);
        Ok(metric)
    }

    // ========================================================================
    // Pending-update access
    // ========================================================================

    /// Cut positions of the pending update along one full group dimension.
    /// Uninformative dimensions report no cuts; an expanded update lists
    /// every interior boundary of a significant dimension.
    pub fn update_cuts<'t>(
        &self,
        state: &'t ThreadState,
        dimension: usize,
    ) -> BoostResult<&'t [usize]> {
        let group_index = state.pending_group.ok_or(BoostError::NoPendingUpdate)?;
        let group = self.group(group_index)?;
        if group.dimension_count() <= dimension {
            return Err(BoostError::DimensionOutOfRange {
                index: dimension,
                count: group.dimension_count(),
            });
        }
        if !self.task.has_model() {
            return Ok(&[]);
        }
        match group.significant_ordinal(dimension) {
            Some(ordinal) => Ok(state.accumulated.splits(ordinal)),
            None => Ok(&[]),
        }
    }

    /// Public value count of the pending update (same contract as
    /// [`Booster::model_value_count`]); zero without a model.
    pub fn update_value_count(&self, state: &ThreadState) -> BoostResult<usize> {
        let group_index = state.pending_group.ok_or(BoostError::NoPendingUpdate)?;
        self.group(group_index)?;
        if !self.task.has_model() {
            return Ok(0);
        }
        self.model_value_count(group_index)
    }

    /// Expanded values of the pending update; empty without a model.
    pub fn update_values<'t>(&self, state: &'t ThreadState) -> BoostResult<&'t [f64]> {
        let group_index = state.pending_group.ok_or(BoostError::NoPendingUpdate)?;
        self.group(group_index)?;
        if !self.task.has_model() {
            return Ok(&[]);
        }
        Ok(state.accumulated.values())
    }

    /// Replace the pending update with caller-provided expanded values for
    /// the given group, re-targeting the thread state at that group.
    pub fn set_update_values(
        &self,
        state: &mut ThreadState,
        group_index: usize,
        values: &[f64],
    ) -> BoostResult<()> {
        let group = self.group(group_index)?;
        state.pending_group = Some(group_index);
        if !self.task.has_model() {
            return Ok(());
        }
        let bins = group.significant_bin_counts();
        let expected = group.tensor_bins() * self.score_width();
        if values.len() != expected {
            return Err(BoostError::ShapeMismatch {
                expected,
                actual: values.len(),
            });
        }
        state.accumulated.reset(bins.len());
        state.accumulated.expand(&bins)?;
        state.accumulated.values_mut().copy_from_slice(values);
        Ok(())
    }

    // ========================================================================
    // Model access
    // ========================================================================

    /// Expanded values of one group's current model; `None` when the
    /// learning type carries no model.
    pub fn current_model_values(&self, group_index: usize) -> BoostResult<Option<&[f64]>> {
        self.group(group_index)?;
        if !self.task.has_model() {
            return Ok(None);
        }
        Ok(Some(self.current_model[group_index].values()))
    }

    /// Expanded values of one group's best-so-far model; `None` when the
    /// learning type carries no model.
    pub fn best_model_values(&self, group_index: usize) -> BoostResult<Option<&[f64]>> {
        self.group(group_index)?;
        if !self.task.has_model() {
            return Ok(None);
        }
        Ok(Some(self.best_model[group_index].values()))
    }
}

//! Shared test harness: a thin wrapper over the public API that builds
//! boosters from per-sample rows and looks model scores back up by bin
//! coordinates.

#![allow(dead_code)]

use ebm_boost::{
    Booster, BoosterConfig, DataSection, FeatureSpec, LearningType, TargetsSource, ThreadState,
    UpdateOptions, UpdateParams, DEFAULT_LEARNING_RATE, DEFAULT_LEAVES_MAX,
    DEFAULT_MIN_SAMPLES_LEAF,
};

/// Relative/absolute float comparison in the style of the engine's
/// reference checks.
pub fn assert_approx(actual: f64, expected: f64, tolerance: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance * scale,
        "expected {expected}, got {actual} (tolerance {tolerance})"
    );
}

/// One sample: a target plus one bin per feature.
#[derive(Clone)]
pub struct Row {
    pub target: f64,
    pub class: i64,
    pub bins: Vec<i64>,
}

/// A regression row.
pub fn reg(target: f64, bins: &[i64]) -> Row {
    Row {
        target,
        class: 0,
        bins: bins.to_vec(),
    }
}

/// A classification row.
pub fn cls(class: i64, bins: &[i64]) -> Row {
    Row {
        target: 0.0,
        class,
        bins: bins.to_vec(),
    }
}

pub struct TestBooster {
    booster: Booster,
    state: ThreadState,
    task: LearningType,
    width: usize,
    feature_bins: Vec<usize>,
    groups: Vec<Vec<usize>>,
}

impl TestBooster {
    pub fn regression(
        seed: i32,
        feature_bins: &[usize],
        groups: &[&[usize]],
        train: &[Row],
        validation: &[Row],
        inner_bags: usize,
    ) -> TestBooster {
        Self::build(
            seed,
            LearningType::Regression,
            feature_bins,
            groups,
            train,
            None,
            validation,
            None,
            inner_bags,
        )
    }

    /// Regression booster warm-started from explicit predictor scores.
    #[allow(clippy::too_many_arguments)]
    pub fn regression_with_scores(
        seed: i32,
        feature_bins: &[usize],
        groups: &[&[usize]],
        train: &[Row],
        train_scores: &[f64],
        validation: &[Row],
        val_scores: &[f64],
        inner_bags: usize,
    ) -> TestBooster {
        Self::build(
            seed,
            LearningType::Regression,
            feature_bins,
            groups,
            train,
            Some(train_scores),
            validation,
            Some(val_scores),
            inner_bags,
        )
    }

    pub fn classification(
        seed: i32,
        classes: usize,
        feature_bins: &[usize],
        groups: &[&[usize]],
        train: &[Row],
        validation: &[Row],
        inner_bags: usize,
    ) -> TestBooster {
        Self::build(
            seed,
            LearningType::Classification { classes },
            feature_bins,
            groups,
            train,
            None,
            validation,
            None,
            inner_bags,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        seed: i32,
        task: LearningType,
        feature_bins: &[usize],
        groups: &[&[usize]],
        train: &[Row],
        train_scores_in: Option<&[f64]>,
        validation: &[Row],
        val_scores_in: Option<&[f64]>,
        inner_bags: usize,
    ) -> TestBooster {
        let width = task.score_width();
        let features: Vec<FeatureSpec> = feature_bins
            .iter()
            .map(|&bin_count| FeatureSpec {
                bin_count,
                categorical: false,
            })
            .collect();
        let group_vecs: Vec<Vec<usize>> = groups.iter().map(|g| g.to_vec()).collect();

        let feature_major = |rows: &[Row]| -> Vec<i64> {
            let mut binned = vec![0i64; feature_bins.len() * rows.len()];
            for (feature, column) in binned.chunks_mut(rows.len().max(1)).enumerate() {
                if rows.is_empty() {
                    break;
                }
                for (sample, row) in rows.iter().enumerate() {
                    column[sample] = row.bins[feature];
                }
            }
            binned
        };
        let train_binned = feature_major(train);
        let val_binned = feature_major(validation);
        let train_float: Vec<f64> = train.iter().map(|r| r.target).collect();
        let val_float: Vec<f64> = validation.iter().map(|r| r.target).collect();
        let train_class: Vec<i64> = train.iter().map(|r| r.class).collect();
        let val_class: Vec<i64> = validation.iter().map(|r| r.class).collect();
        let train_scores = match train_scores_in {
            Some(scores) => scores.to_vec(),
            None => vec![0.0; train.len() * width],
        };
        let val_scores = match val_scores_in {
            Some(scores) => scores.to_vec(),
            None => vec![0.0; validation.len() * width],
        };

        let (train_targets, val_targets) = match task {
            LearningType::Regression => (
                TargetsSource::Regression(&train_float),
                TargetsSource::Regression(&val_float),
            ),
            LearningType::Classification { .. } => (
                TargetsSource::Classification(&train_class),
                TargetsSource::Classification(&val_class),
            ),
        };

        let booster = Booster::new(BoosterConfig {
            seed,
            learning: task,
            features,
            groups: group_vecs.clone(),
            inner_bag_count: inner_bags,
            training: DataSection {
                sample_count: train.len(),
                binned: &train_binned,
                targets: train_targets,
                initial_scores: &train_scores,
            },
            validation: DataSection {
                sample_count: validation.len(),
                binned: &val_binned,
                targets: val_targets,
                initial_scores: &val_scores,
            },
        })
        .expect("booster construction");
        let state = ThreadState::new(&booster);
        TestBooster {
            booster,
            state,
            task,
            width,
            feature_bins: feature_bins.to_vec(),
            groups: group_vecs,
        }
    }

    pub fn group_count(&self) -> usize {
        self.booster.group_count()
    }

    pub fn best_metric(&self) -> f64 {
        self.booster.best_metric()
    }

    /// One default round on one group; returns the validation metric.
    pub fn boost(&mut self, group: usize) -> f64 {
        self.boost_with(
            group,
            UpdateOptions::DEFAULT,
            DEFAULT_LEARNING_RATE,
            DEFAULT_MIN_SAMPLES_LEAF,
            &[],
        )
    }

    /// One round with explicit parameters. An empty `leaves_max` uses the
    /// default budget on every dimension.
    pub fn boost_with(
        &mut self,
        group: usize,
        options: UpdateOptions,
        learning_rate: f64,
        min_samples_leaf: u64,
        leaves_max: &[u64],
    ) -> f64 {
        self.generate_with(group, options, learning_rate, min_samples_leaf, leaves_max);
        self.apply()
    }

    /// Generate only; returns the gain.
    pub fn generate_with(
        &mut self,
        group: usize,
        options: UpdateOptions,
        learning_rate: f64,
        min_samples_leaf: u64,
        leaves_max: &[u64],
    ) -> f64 {
        let dimensions = self.groups[group].len();
        let leaves: Vec<u64> = if leaves_max.is_empty() {
            vec![DEFAULT_LEAVES_MAX; dimensions]
        } else {
            leaves_max.to_vec()
        };
        self.booster
            .generate_update(
                &mut self.state,
                group,
                &UpdateParams {
                    options,
                    learning_rate,
                    min_samples_leaf,
                    leaves_max: &leaves,
                },
            )
            .expect("generate_update")
    }

    /// Apply the pending update; returns the validation metric.
    pub fn apply(&mut self) -> f64 {
        self.booster.apply_update(&self.state).expect("apply_update")
    }

    fn model_offset(&self, group: usize, bins: &[usize]) -> usize {
        let members = &self.groups[group];
        assert_eq!(members.len(), bins.len());
        let mut offset = 0usize;
        let mut stride = 1usize;
        for (dimension, &bin) in bins.iter().enumerate() {
            let bin_count = self.feature_bins[members[dimension]];
            assert!(bin < bin_count);
            offset += bin * stride;
            stride *= bin_count;
        }
        offset
    }

    fn score_from(&self, values: &[f64], group: usize, bins: &[usize], class: usize) -> f64 {
        let offset = self.model_offset(group, bins);
        match self.task {
            LearningType::Regression => {
                assert_eq!(class, 0);
                values[offset]
            }
            LearningType::Classification { classes } if classes == 2 => {
                // One stored logit for class 1; class 0 is pinned at zero.
                if class == 0 {
                    0.0
                } else {
                    values[offset]
                }
            }
            LearningType::Classification { .. } => values[offset * self.width + class],
        }
    }

    /// Current-model score of one tensor cell for one class.
    pub fn current_score(&self, group: usize, bins: &[usize], class: usize) -> f64 {
        let values = self
            .booster
            .current_model_values(group)
            .expect("group index")
            .expect("model present");
        self.score_from(values, group, bins, class)
    }

    /// Best-model score of one tensor cell for one class.
    pub fn best_score(&self, group: usize, bins: &[usize], class: usize) -> f64 {
        let values = self
            .booster
            .best_model_values(group)
            .expect("group index")
            .expect("model present");
        self.score_from(values, group, bins, class)
    }

    /// Full current-model tensor for one group.
    pub fn current_values(&self, group: usize) -> Vec<f64> {
        self.booster
            .current_model_values(group)
            .expect("group index")
            .expect("model present")
            .to_vec()
    }
}

//! EBM Boost - Gradient Boosting Core for Explainable Boosting Machines
//!
//! A cyclic coordinate-descent boosting engine: each round picks one
//! feature group, builds a residual-weighted histogram over its bit-packed
//! training data, grows a shallow decision tree (or draws a random tensor
//! partition), and applies the shrunk update to that group's additive
//! segmented-tensor component while tracking the best iterate by held-out
//! loss.
//!
//! # Architecture
//!
//! ```text
//! BoosterConfig
//!       |
//!       v
//! Booster (features, groups, datasets, bags, models, streams)
//!       |
//!       v                      per round, per thread state
//! generate_update: histogram -> splitter -> accumulated update
//!       |
//!       v
//! apply_update: model += update -> rescore -> validation metric -> best
//! ```
//!
//! # Example
//!
//! ```rust
//! use ebm_boost::{
//!     Booster, BoosterConfig, DataSection, FeatureSpec, LearningType,
//!     TargetsSource, ThreadState, UpdateOptions, UpdateParams,
//! };
//!
//! // One two-bin feature, one training row, one validation row.
//! let config = BoosterConfig {
//!     seed: 42,
//!     learning: LearningType::Regression,
//!     features: vec![FeatureSpec { bin_count: 2, categorical: false }],
//!     groups: vec![vec![0]],
//!     inner_bag_count: 0,
//!     training: DataSection {
//!         sample_count: 1,
//!         binned: &[1],
//!         targets: TargetsSource::Regression(&[10.0]),
//!         initial_scores: &[0.0],
//!     },
//!     validation: DataSection {
//!         sample_count: 1,
//!         binned: &[1],
//!         targets: TargetsSource::Regression(&[12.0]),
//!         initial_scores: &[0.0],
//!     },
//! };
//! let mut booster = Booster::new(config).unwrap();
//! let mut state = ThreadState::new(&booster);
//! let params = UpdateParams {
//!     options: UpdateOptions::DEFAULT,
//!     learning_rate: 0.01,
//!     min_samples_leaf: 1,
//!     leaves_max: &[3],
//! };
//! booster.generate_update(&mut state, 0, &params).unwrap();
//! let metric = booster.apply_update(&state).unwrap();
//! assert!((metric - 141.61).abs() < 1e-9);
//! ```
//!
//! The [`ffi`] module exports the same lifecycle as a C ABI with opaque
//! handles and integer status codes.

pub mod booster;
pub mod config;
pub mod dataset;
pub mod error;
pub mod feature;
pub mod ffi;
pub mod histogram;
pub mod loss;
pub mod random;
pub mod sampling;
mod splitter;
pub mod tensor;
pub mod thread_state;

pub use booster::Booster;
pub use config::{
    BoosterConfig, DataSection, FeatureSpec, UpdateOptions, UpdateParams, DEFAULT_LEARNING_RATE,
    DEFAULT_LEAVES_MAX, DEFAULT_MIN_SAMPLES_LEAF,
};
pub use dataset::TargetsSource;
pub use error::{BoostError, BoostResult};
pub use feature::{Feature, FeatureGroup, MAX_DIMENSIONS};
pub use loss::LearningType;
pub use random::{RandomStream, StreamPurpose};
pub use sampling::SamplingSet;
pub use tensor::SegmentedTensor;
pub use thread_state::ThreadState;

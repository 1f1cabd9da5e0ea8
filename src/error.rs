//! Error Types
//!
//! Every fallible operation in the crate returns [`BoostResult`]. Errors are
//! plain data; the C ABI layer translates them into nonzero status codes or
//! null handles at the boundary. Internal code never panics on bad input.

use thiserror::Error;

/// Errors surfaced by booster construction and the per-round operations.
#[derive(Debug, Error)]
pub enum BoostError {
    /// A caller-supplied argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A feature group index was outside the booster's group table.
    #[error("feature group index {index} out of range ({count} groups)")]
    GroupIndexOutOfRange { index: usize, count: usize },

    /// A dimension index was outside a feature group's dimensionality.
    #[error("dimension index {index} out of range ({count} dimensions)")]
    DimensionOutOfRange { index: usize, count: usize },

    /// A feature index inside a group definition did not name a feature.
    #[error("feature index {index} out of range ({count} features)")]
    FeatureIndexOutOfRange { index: usize, count: usize },

    /// A classification target was negative or not below the class count.
    #[error("target for sample {sample} out of range")]
    TargetOutOfRange { sample: usize },

    /// A binned value was negative or not below the feature's bin count.
    #[error("binned value for feature {feature}, sample {sample} out of range")]
    BinOutOfRange { feature: usize, sample: usize },

    /// A tensor's cell count would not fit in memory.
    #[error("tensor size overflows the platform word")]
    TensorTooLarge,

    /// A feature group had more significant dimensions than supported.
    #[error("feature group has {count} significant dimensions (max {max})")]
    TooManyDimensions { count: usize, max: usize },

    /// An apply or update accessor ran without a preceding generate.
    #[error("no pending model update on this thread state")]
    NoPendingUpdate,

    /// Two tensors that must agree in shape did not.
    #[error("tensor shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// Result type for booster operations.
pub type BoostResult<T> = Result<T, BoostError>;

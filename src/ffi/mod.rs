//! C ABI
//!
//! The exported entry points mirror the engine's external contract: opaque
//! booster and thread-state handles, integer status returns (0 ok, 1
//! error), null-tolerant frees, and full argument validation before any
//! allocation. All pointers are raw and non-owning unless a free function
//! says otherwise.
//!
//! Threading contract: distinct thread states may generate updates
//! concurrently against one booster, but the caller must serialize
//! `apply_model_update` calls per booster and must free every thread
//! state before its booster.

use log::{error, trace};

use crate::booster::Booster;
use crate::config::{BoosterConfig, DataSection, FeatureSpec, UpdateOptions, UpdateParams};
use crate::dataset::TargetsSource;
use crate::loss::LearningType;
use crate::thread_state::ThreadState;

/// Opaque booster handle.
pub type BoosterHandle = *mut Booster;

/// Thread-state handle payload: the scratch plus the booster it serves.
pub struct ThreadStateBoosting {
    booster: *mut Booster,
    state: ThreadState,
}

/// Opaque thread-state handle.
pub type ThreadStateBoostingHandle = *mut ThreadStateBoosting;

const STATUS_OK: i64 = 0;
const STATUS_ERROR: i64 = 1;

fn usize_from(value: i64) -> Option<usize> {
    usize::try_from(value).ok()
}

unsafe fn slice_or_empty<'a, T>(pointer: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        return Some(&[]);
    }
    if pointer.is_null() {
        return None;
    }
    Some(std::slice::from_raw_parts(pointer, len))
}

/// Shared construction path for both booster kinds.
#[allow(clippy::too_many_arguments)]
unsafe fn build_booster(
    random_seed: i32,
    learning: LearningType,
    count_features: i64,
    features_categorical: *const i64,
    features_bin_count: *const i64,
    count_feature_groups: i64,
    feature_groups_feature_count: *const i64,
    feature_groups_feature_indices: *const i64,
    count_training_samples: i64,
    training_binned: *const i64,
    training_targets_int: *const i64,
    training_targets_float: *const f64,
    training_weights: *const f64,
    training_scores: *const f64,
    count_validation_samples: i64,
    validation_binned: *const i64,
    validation_targets_int: *const i64,
    validation_targets_float: *const f64,
    validation_weights: *const f64,
    validation_scores: *const f64,
    count_inner_bags: i64,
) -> BoosterHandle {
    // Weights are reserved parameters: reject rather than silently ignore.
    if !training_weights.is_null() || !validation_weights.is_null() {
        error!("build_booster sample weights are not supported and must be null");
        return std::ptr::null_mut();
    }
    if count_features < 0
        || count_feature_groups < 0
        || count_training_samples < 0
        || count_validation_samples < 0
        || count_inner_bags < 0
    {
        error!("build_booster counts must be nonnegative");
        return std::ptr::null_mut();
    }
    let (Some(feature_count), Some(group_count), Some(train_count), Some(val_count), Some(bag_count)) = (
        usize_from(count_features),
        usize_from(count_feature_groups),
        usize_from(count_training_samples),
        usize_from(count_validation_samples),
        usize_from(count_inner_bags),
    ) else {
        error!("build_booster counts exceed the platform word");
        return std::ptr::null_mut();
    };

    let width = learning.score_width();
    let (Some(train_scores_len), Some(val_scores_len)) = (
        train_count.checked_mul(width),
        val_count.checked_mul(width),
    ) else {
        error!("build_booster score buffer size overflows");
        return std::ptr::null_mut();
    };
    let (Some(train_binned_len), Some(val_binned_len)) = (
        train_count.checked_mul(feature_count),
        val_count.checked_mul(feature_count),
    ) else {
        error!("build_booster binned buffer size overflows");
        return std::ptr::null_mut();
    };

    let Some(categorical) = slice_or_empty(features_categorical, feature_count) else {
        error!("build_booster features_categorical cannot be null");
        return std::ptr::null_mut();
    };
    let Some(bin_counts) = slice_or_empty(features_bin_count, feature_count) else {
        error!("build_booster features_bin_count cannot be null");
        return std::ptr::null_mut();
    };
    let mut features = Vec::with_capacity(feature_count);
    for (&bins, &is_categorical) in bin_counts.iter().zip(categorical.iter()) {
        let Some(bin_count) = usize_from(bins) else {
            error!("build_booster feature bin count out of range");
            return std::ptr::null_mut();
        };
        features.push(FeatureSpec {
            bin_count,
            categorical: is_categorical != 0,
        });
    }

    let Some(group_sizes) = slice_or_empty(feature_groups_feature_count, group_count) else {
        error!("build_booster feature_groups_feature_count cannot be null");
        return std::ptr::null_mut();
    };
    let mut total_indices = 0usize;
    for &size in group_sizes {
        let Some(size) = usize_from(size) else {
            error!("build_booster group feature count out of range");
            return std::ptr::null_mut();
        };
        total_indices += size;
    }
    let Some(flat_indices) = slice_or_empty(feature_groups_feature_indices, total_indices) else {
        error!("build_booster feature_groups_feature_indices cannot be null");
        return std::ptr::null_mut();
    };
    let mut groups = Vec::with_capacity(group_count);
    let mut cursor = 0usize;
    for &size in group_sizes {
        let size = size as usize;
        let mut members = Vec::with_capacity(size);
        for &index in &flat_indices[cursor..cursor + size] {
            let Some(index) = usize_from(index) else {
                error!("build_booster group feature index out of range");
                return std::ptr::null_mut();
            };
            members.push(index);
        }
        cursor += size;
        groups.push(members);
    }

    let Some(train_binned) = slice_or_empty(training_binned, train_binned_len) else {
        error!("build_booster training binned data cannot be null");
        return std::ptr::null_mut();
    };
    let Some(val_binned) = slice_or_empty(validation_binned, val_binned_len) else {
        error!("build_booster validation binned data cannot be null");
        return std::ptr::null_mut();
    };
    let Some(train_scores) = slice_or_empty(training_scores, train_scores_len) else {
        error!("build_booster training scores cannot be null");
        return std::ptr::null_mut();
    };
    let Some(val_scores) = slice_or_empty(validation_scores, val_scores_len) else {
        error!("build_booster validation scores cannot be null");
        return std::ptr::null_mut();
    };

    let (train_targets, val_targets) = if learning.is_classification() {
        let Some(train) = slice_or_empty(training_targets_int, train_count) else {
            error!("build_booster training targets cannot be null");
            return std::ptr::null_mut();
        };
        let Some(val) = slice_or_empty(validation_targets_int, val_count) else {
            error!("build_booster validation targets cannot be null");
            return std::ptr::null_mut();
        };
        (
            TargetsSource::Classification(train),
            TargetsSource::Classification(val),
        )
    } else {
        let Some(train) = slice_or_empty(training_targets_float, train_count) else {
            error!("build_booster training targets cannot be null");
            return std::ptr::null_mut();
        };
        let Some(val) = slice_or_empty(validation_targets_float, val_count) else {
            error!("build_booster validation targets cannot be null");
            return std::ptr::null_mut();
        };
        (
            TargetsSource::Regression(train),
            TargetsSource::Regression(val),
        )
    };

    let config = BoosterConfig {
        seed: random_seed,
        learning,
        features,
        groups,
        inner_bag_count: bag_count,
        training: DataSection {
            sample_count: train_count,
            binned: train_binned,
            targets: train_targets,
            initial_scores: train_scores,
        },
        validation: DataSection {
            sample_count: val_count,
            binned: val_binned,
            targets: val_targets,
            initial_scores: val_scores,
        },
    };
    match Booster::new(config) {
        Ok(booster) => Box::into_raw(Box::new(booster)),
        Err(err) => {
            error!("build_booster failed: {}", err);
            std::ptr::null_mut()
        }
    }
}

/// Create a classification booster; null on invalid arguments.
///
/// # Safety
///
/// Every non-null pointer must reference a buffer of the documented
/// length, and `optional_params` is ignored. The returned handle must be
/// released with [`free_booster`].
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn create_classification_booster(
    random_seed: i32,
    count_target_classes: i64,
    count_features: i64,
    features_categorical: *const i64,
    features_bin_count: *const i64,
    count_feature_groups: i64,
    feature_groups_feature_count: *const i64,
    feature_groups_feature_indices: *const i64,
    count_training_samples: i64,
    training_binned: *const i64,
    training_targets: *const i64,
    training_weights: *const f64,
    training_scores: *const f64,
    count_validation_samples: i64,
    validation_binned: *const i64,
    validation_targets: *const i64,
    validation_weights: *const f64,
    validation_scores: *const f64,
    count_inner_bags: i64,
    optional_params: *const f64,
) -> BoosterHandle {
    trace!("entered create_classification_booster");
    let _ = optional_params;
    if count_target_classes < 0 {
        error!("create_classification_booster count_target_classes cannot be negative");
        return std::ptr::null_mut();
    }
    if count_target_classes == 0 && (0 != count_training_samples || 0 != count_validation_samples) {
        error!("create_classification_booster zero classes require zero samples");
        return std::ptr::null_mut();
    }
    let Some(classes) = usize_from(count_target_classes) else {
        error!("create_classification_booster count_target_classes too large");
        return std::ptr::null_mut();
    };
    let handle = build_booster(
        random_seed,
        LearningType::Classification { classes },
        count_features,
        features_categorical,
        features_bin_count,
        count_feature_groups,
        feature_groups_feature_count,
        feature_groups_feature_indices,
        count_training_samples,
        training_binned,
        training_targets,
        std::ptr::null(),
        training_weights,
        training_scores,
        count_validation_samples,
        validation_binned,
        validation_targets,
        std::ptr::null(),
        validation_weights,
        validation_scores,
        count_inner_bags,
    );
    trace!("exited create_classification_booster");
    handle
}

/// Create a regression booster; null on invalid arguments.
///
/// # Safety
///
/// Same pointer contracts as [`create_classification_booster`], with
/// float targets and no class count.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn create_regression_booster(
    random_seed: i32,
    count_features: i64,
    features_categorical: *const i64,
    features_bin_count: *const i64,
    count_feature_groups: i64,
    feature_groups_feature_count: *const i64,
    feature_groups_feature_indices: *const i64,
    count_training_samples: i64,
    training_binned: *const i64,
    training_targets: *const f64,
    training_weights: *const f64,
    training_scores: *const f64,
    count_validation_samples: i64,
    validation_binned: *const i64,
    validation_targets: *const f64,
    validation_weights: *const f64,
    validation_scores: *const f64,
    count_inner_bags: i64,
    optional_params: *const f64,
) -> BoosterHandle {
    trace!("entered create_regression_booster");
    let _ = optional_params;
    let handle = build_booster(
        random_seed,
        LearningType::Regression,
        count_features,
        features_categorical,
        features_bin_count,
        count_feature_groups,
        feature_groups_feature_count,
        feature_groups_feature_indices,
        count_training_samples,
        training_binned,
        std::ptr::null(),
        training_targets,
        training_weights,
        training_scores,
        count_validation_samples,
        validation_binned,
        std::ptr::null(),
        validation_targets,
        validation_weights,
        validation_scores,
        count_inner_bags,
    );
    trace!("exited create_regression_booster");
    handle
}

/// Release a booster. Null is tolerated.
///
/// # Safety
///
/// `booster_handle` must be null or a live handle from a create call, and
/// no thread state referencing it may still be alive.
#[no_mangle]
pub unsafe extern "C" fn free_booster(booster_handle: BoosterHandle) {
    trace!("entered free_booster");
    if !booster_handle.is_null() {
        drop(Box::from_raw(booster_handle));
    }
    trace!("exited free_booster");
}

/// Allocate per-thread boosting scratch bound to a booster.
///
/// # Safety
///
/// `booster_handle` must be a live booster handle; the returned handle
/// must be released with [`free_thread_state_boosting`] before the
/// booster is freed.
#[no_mangle]
pub unsafe extern "C" fn create_thread_state_boosting(
    booster_handle: BoosterHandle,
) -> ThreadStateBoostingHandle {
    trace!("entered create_thread_state_boosting");
    if booster_handle.is_null() {
        error!("create_thread_state_boosting booster_handle cannot be null");
        return std::ptr::null_mut();
    }
    let state = ThreadState::new(&*booster_handle);
    let handle = Box::into_raw(Box::new(ThreadStateBoosting {
        booster: booster_handle,
        state,
    }));
    trace!("exited create_thread_state_boosting");
    handle
}

/// Release a thread state. Null is tolerated.
///
/// # Safety
///
/// `handle` must be null or a live thread-state handle.
#[no_mangle]
pub unsafe extern "C" fn free_thread_state_boosting(handle: ThreadStateBoostingHandle) {
    trace!("entered free_thread_state_boosting");
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
    trace!("exited free_thread_state_boosting");
}

/// Generate a candidate update for one feature group into the thread
/// state. Writes the gain through `gain_out` when non-null.
///
/// # Safety
///
/// `thread_state_handle` must be live; `leaves_max` must hold one entry
/// per dimension of the addressed group. Concurrent calls are allowed only
/// on distinct thread states.
#[no_mangle]
pub unsafe extern "C" fn generate_model_update(
    thread_state_handle: ThreadStateBoostingHandle,
    index_feature_group: i64,
    options: i64,
    learning_rate: f64,
    count_samples_required_for_child_split_min: i64,
    leaves_max: *const i64,
    gain_out: *mut f64,
) -> i64 {
    trace!("entered generate_model_update");
    if thread_state_handle.is_null() {
        error!("generate_model_update thread_state_handle cannot be null");
        return STATUS_ERROR;
    }
    let thread_state = &mut *thread_state_handle;
    let booster = &*thread_state.booster;
    let Some(group_index) = usize_from(index_feature_group) else {
        error!("generate_model_update index_feature_group out of range");
        return STATUS_ERROR;
    };
    let dimension_count = match booster.group_dimension_count(group_index) {
        Ok(count) => count,
        Err(err) => {
            error!("generate_model_update: {}", err);
            return STATUS_ERROR;
        }
    };
    let Some(leaves_raw) = slice_or_empty(leaves_max, dimension_count) else {
        error!("generate_model_update leaves_max cannot be null");
        return STATUS_ERROR;
    };
    let leaves: Vec<u64> = leaves_raw.iter().map(|&v| v.max(1) as u64).collect();
    let min_samples_leaf = count_samples_required_for_child_split_min.max(0) as u64;
    let params = UpdateParams {
        options: UpdateOptions(options as u64),
        learning_rate,
        min_samples_leaf,
        leaves_max: &leaves,
    };
    match booster.generate_update(&mut thread_state.state, group_index, &params) {
        Ok(gain) => {
            if !gain_out.is_null() {
                *gain_out = gain;
            }
            trace!("exited generate_model_update");
            STATUS_OK
        }
        Err(err) => {
            error!("generate_model_update: {}", err);
            STATUS_ERROR
        }
    }
}

/// Read the pending update's cut positions along one group dimension.
///
/// # Safety
///
/// `count_cuts_inout` must be a valid pointer; `cut_indices_out`, when
/// non-null, must hold room for every interior boundary of the dimension.
#[no_mangle]
pub unsafe extern "C" fn get_model_update_cuts(
    thread_state_handle: ThreadStateBoostingHandle,
    index_dimension: i64,
    count_cuts_inout: *mut i64,
    cut_indices_out: *mut i64,
) -> i64 {
    trace!("entered get_model_update_cuts");
    if thread_state_handle.is_null() || count_cuts_inout.is_null() {
        error!("get_model_update_cuts handles cannot be null");
        return STATUS_ERROR;
    }
    let thread_state = &*thread_state_handle;
    let booster = &*thread_state.booster;
    let Some(dimension) = usize_from(index_dimension) else {
        *count_cuts_inout = 0;
        error!("get_model_update_cuts index_dimension out of range");
        return STATUS_ERROR;
    };
    match booster.update_cuts(&thread_state.state, dimension) {
        Ok(cuts) => {
            *count_cuts_inout = cuts.len() as i64;
            if !cut_indices_out.is_null() {
                for (slot, &cut) in cuts.iter().enumerate() {
                    *cut_indices_out.add(slot) = cut as i64;
                }
            }
            trace!("exited get_model_update_cuts");
            STATUS_OK
        }
        Err(err) => {
            *count_cuts_inout = 0;
            error!("get_model_update_cuts: {}", err);
            STATUS_ERROR
        }
    }
}

/// Copy the pending update's expanded values out. With no model the call
/// succeeds and writes nothing.
///
/// # Safety
///
/// `values_out` must hold the group's full tensor value count when a
/// model exists.
#[no_mangle]
pub unsafe extern "C" fn get_model_update_expanded(
    thread_state_handle: ThreadStateBoostingHandle,
    values_out: *mut f64,
) -> i64 {
    trace!("entered get_model_update_expanded");
    if thread_state_handle.is_null() {
        error!("get_model_update_expanded thread_state_handle cannot be null");
        return STATUS_ERROR;
    }
    let thread_state = &*thread_state_handle;
    let booster = &*thread_state.booster;
    let value_count = match booster.update_value_count(&thread_state.state) {
        Ok(count) => count,
        Err(err) => {
            error!("get_model_update_expanded: {}", err);
            return STATUS_ERROR;
        }
    };
    if value_count == 0 {
        trace!("exited get_model_update_expanded, nothing to copy");
        return STATUS_OK;
    }
    if values_out.is_null() {
        error!("get_model_update_expanded values_out cannot be null");
        return STATUS_ERROR;
    }
    match booster.update_values(&thread_state.state) {
        Ok(values) => {
            std::ptr::copy_nonoverlapping(values.as_ptr(), values_out, value_count);
            trace!("exited get_model_update_expanded");
            STATUS_OK
        }
        Err(err) => {
            error!("get_model_update_expanded: {}", err);
            STATUS_ERROR
        }
    }
}

/// Replace the pending update with caller-provided expanded values,
/// re-targeting the thread state at `index_feature_group`. With no model
/// the call succeeds and reads nothing.
///
/// # Safety
///
/// `values_in` must hold the group's full tensor value count when a model
/// exists.
#[no_mangle]
pub unsafe extern "C" fn set_model_update_expanded(
    thread_state_handle: ThreadStateBoostingHandle,
    index_feature_group: i64,
    values_in: *const f64,
) -> i64 {
    trace!("entered set_model_update_expanded");
    if thread_state_handle.is_null() {
        error!("set_model_update_expanded thread_state_handle cannot be null");
        return STATUS_ERROR;
    }
    let thread_state = &mut *thread_state_handle;
    let booster = &*thread_state.booster;
    let Some(group_index) = usize_from(index_feature_group) else {
        error!("set_model_update_expanded index_feature_group out of range");
        return STATUS_ERROR;
    };
    if !booster.task().has_model() {
        return match booster.set_update_values(&mut thread_state.state, group_index, &[]) {
            Ok(()) => {
                trace!("exited set_model_update_expanded, no model");
                STATUS_OK
            }
            Err(err) => {
                error!("set_model_update_expanded: {}", err);
                STATUS_ERROR
            }
        };
    }
    let value_count = match booster.model_value_count(group_index) {
        Ok(count) => count,
        Err(err) => {
            error!("set_model_update_expanded: {}", err);
            return STATUS_ERROR;
        }
    };
    let Some(values) = slice_or_empty(values_in, value_count) else {
        error!("set_model_update_expanded values_in cannot be null");
        return STATUS_ERROR;
    };
    match booster.set_update_values(&mut thread_state.state, group_index, values) {
        Ok(()) => {
            trace!("exited set_model_update_expanded");
            STATUS_OK
        }
        Err(err) => {
            error!("set_model_update_expanded: {}", err);
            STATUS_ERROR
        }
    }
}

/// Apply the pending update. Writes the validation metric through
/// `validation_metric_out` when non-null.
///
/// # Safety
///
/// `thread_state_handle` must be live. Applies against one booster must
/// be externally serialized; no generate may run on the same booster
/// concurrently with an apply.
#[no_mangle]
pub unsafe extern "C" fn apply_model_update(
    thread_state_handle: ThreadStateBoostingHandle,
    validation_metric_out: *mut f64,
) -> i64 {
    trace!("entered apply_model_update");
    if thread_state_handle.is_null() {
        error!("apply_model_update thread_state_handle cannot be null");
        return STATUS_ERROR;
    }
    let thread_state = &mut *thread_state_handle;
    let booster = &mut *thread_state.booster;
    match booster.apply_update(&thread_state.state) {
        Ok(metric) => {
            if !validation_metric_out.is_null() {
                *validation_metric_out = metric;
            }
            trace!("exited apply_model_update");
            STATUS_OK
        }
        Err(err) => {
            error!("apply_model_update: {}", err);
            STATUS_ERROR
        }
    }
}

unsafe fn copy_model_values(
    booster: &Booster,
    index_feature_group: i64,
    values_out: *mut f64,
    best: bool,
) -> i64 {
    let Some(group_index) = usize_from(index_feature_group) else {
        error!("get_model_feature_group index_feature_group out of range");
        return STATUS_ERROR;
    };
    let values = if best {
        booster.best_model_values(group_index)
    } else {
        booster.current_model_values(group_index)
    };
    match values {
        Ok(None) => STATUS_OK,
        Ok(Some(values)) => {
            if values_out.is_null() {
                error!("get_model_feature_group values_out cannot be null");
                return STATUS_ERROR;
            }
            let value_count = match booster.model_value_count(group_index) {
                Ok(count) => count,
                Err(err) => {
                    error!("get_model_feature_group: {}", err);
                    return STATUS_ERROR;
                }
            };
            std::ptr::copy_nonoverlapping(values.as_ptr(), values_out, value_count);
            STATUS_OK
        }
        Err(err) => {
            error!("get_model_feature_group: {}", err);
            STATUS_ERROR
        }
    }
}

/// Copy one group's best-so-far model tensor out. With no model the call
/// succeeds and writes nothing.
///
/// # Safety
///
/// `model_feature_group_tensor_out`, when required, must hold the group's
/// full tensor value count.
#[no_mangle]
pub unsafe extern "C" fn get_best_model_feature_group(
    booster_handle: BoosterHandle,
    index_feature_group: i64,
    model_feature_group_tensor_out: *mut f64,
) -> i64 {
    trace!("entered get_best_model_feature_group");
    if booster_handle.is_null() {
        error!("get_best_model_feature_group booster_handle cannot be null");
        return STATUS_ERROR;
    }
    let status = copy_model_values(
        &*booster_handle,
        index_feature_group,
        model_feature_group_tensor_out,
        true,
    );
    trace!("exited get_best_model_feature_group");
    status
}

/// Copy one group's current model tensor out. With no model the call
/// succeeds and writes nothing.
///
/// # Safety
///
/// `model_feature_group_tensor_out`, when required, must hold the group's
/// full tensor value count.
#[no_mangle]
pub unsafe extern "C" fn get_current_model_feature_group(
    booster_handle: BoosterHandle,
    index_feature_group: i64,
    model_feature_group_tensor_out: *mut f64,
) -> i64 {
    trace!("entered get_current_model_feature_group");
    if booster_handle.is_null() {
        error!("get_current_model_feature_group booster_handle cannot be null");
        return STATUS_ERROR;
    }
    let status = copy_model_values(
        &*booster_handle,
        index_feature_group,
        model_feature_group_tensor_out,
        false,
    );
    trace!("exited get_current_model_feature_group");
    status
}

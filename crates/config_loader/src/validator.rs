//! Configuration validation.
//!
//! Rules:
//! - environment_id non-empty
//! - base_dir non-empty
//! - camera ids unique and non-empty
//! - sampling_rate_hz > 0, segment_duration_s > 0
//! - batch width an exact multiple of segment width
//! - file store requires base_path

use std::collections::HashSet;

use contracts::{PipelineBlueprint, PipelineError, StoreKind};

/// Validate a PipelineBlueprint.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    validate_data(blueprint)?;
    validate_timing(blueprint)?;
    validate_store(blueprint)?;
    Ok(())
}

fn validate_data(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    let data = &blueprint.data;

    if data.environment_id.is_empty() {
        return Err(PipelineError::config_validation(
            "data.environment_id",
            "environment_id cannot be empty",
        ));
    }

    if data.base_dir.as_os_str().is_empty() {
        return Err(PipelineError::config_validation(
            "data.base_dir",
            "base_dir cannot be empty",
        ));
    }

    let mut seen = HashSet::new();
    for camera in &data.cameras {
        if camera.is_empty() {
            return Err(PipelineError::config_validation(
                "data.cameras",
                "camera id cannot be empty",
            ));
        }
        if !seen.insert(camera) {
            return Err(PipelineError::config_validation(
                format!("data.cameras[id={camera}]"),
                "duplicate camera id",
            ));
        }
    }

    Ok(())
}

fn validate_timing(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    let timing = &blueprint.timing;

    if timing.sampling_rate_hz == 0 {
        return Err(PipelineError::config_validation(
            "timing.sampling_rate_hz",
            "sampling_rate_hz must be > 0",
        ));
    }

    if timing.segment_duration_s == 0 {
        return Err(PipelineError::config_validation(
            "timing.segment_duration_s",
            "segment_duration_s must be > 0",
        ));
    }

    if timing.batch_duration_s % timing.segment_duration_s != 0 {
        return Err(PipelineError::config_validation(
            "timing.batch_duration_s",
            format!(
                "batch_duration_s ({}) must be an exact multiple of segment_duration_s ({})",
                timing.batch_duration_s, timing.segment_duration_s
            ),
        ));
    }

    Ok(())
}

fn validate_store(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    let store = &blueprint.store;

    if store.stage.is_empty() {
        return Err(PipelineError::config_validation(
            "store.stage",
            "stage cannot be empty",
        ));
    }

    if store.kind == StoreKind::File && store.base_path.is_none() {
        return Err(PipelineError::config_validation(
            "store.base_path",
            "base_path is required when store.kind = \"file\"",
        ));
    }

    Ok(())
}

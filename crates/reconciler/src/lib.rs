//! # Drift Reconciler
//!
//! Corrects frame counts and timestamps window by window.
//!
//! Cameras nominally capture `sampling_rate * window_width` frames per
//! window, but encoder jitter produces occasional surplus or deficit.
//! The reconciler folds over a camera's windows in time order, threading
//! a [`CarryoverState`]:
//!
//! - exactly one surplus frame is treated as sampling noise and dropped
//! - a larger surplus is carried into the next window, renumbered from 0
//! - a deficit is recorded as negative drift and never backfilled
//!
//! Every emitted frame gets a deterministic corrected timestamp
//! `base + index * frame_period`, so re-processing the same input tree
//! reproduces identical identities.

use chrono::{DateTime, TimeDelta, Utc};
use contracts::{
    CameraId, CarryoverState, Frame, PipelineError, ReconciledSegment, TimeWindow, TimingConfig,
};
use metrics::{counter, gauge};
use tracing::{debug, instrument, warn};

/// Per-camera, per-window drift correction.
#[derive(Debug, Clone)]
pub struct DriftReconciler {
    nominal_frames: usize,
    frame_period: TimeDelta,
    adjust_timestamps: bool,
}

impl DriftReconciler {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            nominal_frames: timing.nominal_frames(),
            frame_period: timing.frame_period(),
            adjust_timestamps: timing.adjust_timestamps,
        }
    }

    /// Carryover state for the start of a camera's processed range.
    pub fn begin(&self, camera_id: CameraId) -> CarryoverState {
        CarryoverState::empty(camera_id)
    }

    /// Reconcile one window.
    ///
    /// `observed` holds the raw frames found on disk for `window`; their
    /// sequence numbers must form the contiguous range `0..n`. The carried
    /// surplus from the previous window is prepended before counting.
    ///
    /// Returns the corrected segment and the state to thread into the
    /// next window.
    #[instrument(skip_all, fields(camera = %carry.camera_id, window = %window))]
    pub fn reconcile(
        &self,
        window: &TimeWindow,
        mut observed: Vec<Frame>,
        carry: CarryoverState,
    ) -> Result<(ReconciledSegment, CarryoverState), PipelineError> {
        observed.sort_by_key(|f| f.sequence_number);
        self.check_contiguity(window, &carry, &observed)?;

        let camera_id = carry.camera_id.clone();

        // Carried frames keep their corrected timestamps; in adjust mode
        // the first of them anchors the whole window's timeline.
        let base = match carry.pending.front() {
            Some(first) if self.adjust_timestamps => first.timestamp.unwrap_or(window.start),
            _ => window.start,
        };

        let mut combined: Vec<Frame> = carry.pending.into_iter().chain(observed).collect();
        let n_eff = combined.len();
        let n_nom = self.nominal_frames;

        let mut dropped = 0usize;
        let surplus = if n_eff == n_nom + 1 {
            // A single extra frame is sampling noise, not real drift.
            combined.pop();
            dropped = 1;
            warn!(n_eff, n_nom, "dropping single surplus frame as noise");
            Vec::new()
        } else if n_eff > n_nom {
            combined.split_off(n_nom)
        } else {
            Vec::new()
        };

        for (index, frame) in combined.iter_mut().enumerate() {
            frame.window = *window;
            frame.sequence_number = index as u32;
            frame.timestamp = Some(corrected_timestamp(base, self.frame_period, index));
        }

        let next_window = window.next();
        let mut pending = std::collections::VecDeque::with_capacity(surplus.len());
        for (index, mut frame) in surplus.into_iter().enumerate() {
            frame.window = next_window;
            frame.sequence_number = index as u32;
            frame.timestamp = Some(corrected_timestamp(base, self.frame_period, n_nom + index));
            pending.push_back(frame);
        }

        let drift = if dropped > 0 {
            0
        } else {
            n_eff as i64 - n_nom as i64
        };

        if !pending.is_empty() {
            debug!(carried = pending.len(), "carrying surplus frames forward");
        }

        counter!("reconciler_windows_total", "camera" => camera_id.to_string()).increment(1);
        counter!("reconciler_frames_emitted_total", "camera" => camera_id.to_string())
            .increment(combined.len() as u64);
        counter!("reconciler_frames_dropped_total", "camera" => camera_id.to_string())
            .increment(dropped as u64);
        counter!("reconciler_frames_carried_total", "camera" => camera_id.to_string())
            .increment(pending.len() as u64);
        gauge!("reconciler_drift_frames", "camera" => camera_id.to_string()).set(drift as f64);

        let segment = ReconciledSegment {
            camera_id: camera_id.clone(),
            window: *window,
            frames: combined,
        };

        let next_carry = CarryoverState {
            camera_id,
            drift_count: drift,
            pending,
        };

        Ok((segment, next_carry))
    }

    fn check_contiguity(
        &self,
        window: &TimeWindow,
        carry: &CarryoverState,
        observed: &[Frame],
    ) -> Result<(), PipelineError> {
        for (expected, frame) in observed.iter().enumerate() {
            if frame.sequence_number as usize != expected {
                return Err(PipelineError::sequencing(
                    carry.camera_id.clone(),
                    window.start,
                    format!(
                        "expected frame index {expected}, found {} ({} observed)",
                        frame.sequence_number,
                        observed.len()
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn corrected_timestamp(base: DateTime<Utc>, period: TimeDelta, index: usize) -> DateTime<Utc> {
    base + period * (index as i32)
}

//! Shared pipeline constants.
//!
//! Capture parameters are fixed by the upstream recording setup: every
//! camera writes 10 s segments at 10 fps, grouped into 10 min batches.

use chrono::TimeDelta;

/// Default root of the local pose-detection output tree.
pub const DEFAULT_BASE_DATA_DIRECTORY: &str = "/data";

/// Default pipeline stage name used for persistence keys.
pub const DEFAULT_PIPELINE_STAGE: &str = "pose_reconciliation_2d";

/// Nominal sampling rate in frames per second.
pub const SAMPLING_RATE_HZ: u32 = 10;

/// Duration of one processing segment in seconds.
pub const SEGMENT_DURATION_SECONDS: u32 = 10;

/// Duration of one discovery batch in seconds.
pub const BATCH_DURATION_SECONDS: u32 = 600;

/// Nominal time spacing between consecutive frames.
pub const FRAME_PERIOD_MICROSECONDS: i64 = 100_000;

/// Whether carried-over frames re-anchor the following window's timestamps.
pub const DEFAULT_ADJUST_TIMESTAMPS: bool = true;

/// Nominal frame count for a segment of the given width at the given rate.
pub fn nominal_frames(sampling_rate_hz: u32, duration_seconds: u32) -> usize {
    (sampling_rate_hz as usize) * (duration_seconds as usize)
}

/// Frame period derived from a sampling rate.
pub fn frame_period(sampling_rate_hz: u32) -> TimeDelta {
    TimeDelta::microseconds(1_000_000 / sampling_rate_hz as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_frames_per_segment() {
        assert_eq!(nominal_frames(SAMPLING_RATE_HZ, SEGMENT_DURATION_SECONDS), 100);
    }

    #[test]
    fn test_nominal_frames_per_batch() {
        assert_eq!(nominal_frames(SAMPLING_RATE_HZ, BATCH_DURATION_SECONDS), 6000);
    }

    #[test]
    fn test_frame_period() {
        assert_eq!(
            frame_period(SAMPLING_RATE_HZ),
            TimeDelta::microseconds(FRAME_PERIOD_MICROSECONDS)
        );
    }
}

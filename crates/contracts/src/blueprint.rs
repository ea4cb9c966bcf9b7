//! PipelineBlueprint - Config Loader output
//!
//! Describes a complete processing setup: data tree location, capture
//! timing, and persistence target.

use std::path::PathBuf;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{constants, LayoutVariant};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Data tree settings
    pub data: DataConfig,

    /// Capture timing settings
    #[serde(default)]
    pub timing: TimingConfig,

    /// Persistence settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// Where and how the pose-detection output tree is laid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root of the local output tree
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Environment the cameras belong to
    pub environment_id: String,

    /// On-disk layout variant (a configuration choice, not auto-detected)
    pub layout: LayoutVariant,

    /// Cameras to process; empty = discover via wildcard glob
    #[serde(default)]
    pub cameras: Vec<String>,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_BASE_DATA_DIRECTORY)
}

/// Nominal capture timing.
///
/// `nominal_frames` is derived, never configured, so
/// `nominal_frames = sampling_rate × segment_duration` holds by
/// construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Sampling rate in frames per second
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate_hz: u32,

    /// Processing segment width in seconds
    #[serde(default = "default_segment_duration")]
    pub segment_duration_s: u32,

    /// Discovery batch width in seconds; must be an exact multiple of
    /// the segment width
    #[serde(default = "default_batch_duration")]
    pub batch_duration_s: u32,

    /// Re-anchor a lagging camera to its own observed cadence instead of
    /// snapping back to the nominal window boundary
    #[serde(default = "default_adjust_timestamps")]
    pub adjust_timestamps: bool,
}

fn default_sampling_rate() -> u32 {
    constants::SAMPLING_RATE_HZ
}

fn default_segment_duration() -> u32 {
    constants::SEGMENT_DURATION_SECONDS
}

fn default_batch_duration() -> u32 {
    constants::BATCH_DURATION_SECONDS
}

fn default_adjust_timestamps() -> bool {
    constants::DEFAULT_ADJUST_TIMESTAMPS
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: default_sampling_rate(),
            segment_duration_s: default_segment_duration(),
            batch_duration_s: default_batch_duration(),
            adjust_timestamps: default_adjust_timestamps(),
        }
    }
}

impl TimingConfig {
    /// Expected frame count per processing segment.
    pub fn nominal_frames(&self) -> usize {
        constants::nominal_frames(self.sampling_rate_hz, self.segment_duration_s)
    }

    /// Nominal spacing between consecutive frames.
    pub fn frame_period(&self) -> TimeDelta {
        constants::frame_period(self.sampling_rate_hz)
    }

    /// Processing segment width.
    pub fn segment_width(&self) -> TimeDelta {
        TimeDelta::seconds(self.segment_duration_s as i64)
    }

    /// Discovery batch width.
    pub fn batch_width(&self) -> TimeDelta {
        TimeDelta::seconds(self.batch_duration_s as i64)
    }
}

/// Persistence target configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Pipeline stage name used in persistence keys
    #[serde(default = "default_stage")]
    pub stage: String,

    /// Store backend
    #[serde(default)]
    pub kind: StoreKind,

    /// Output directory (file store only)
    #[serde(default)]
    pub base_path: Option<PathBuf>,
}

fn default_stage() -> String {
    constants::DEFAULT_PIPELINE_STAGE.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            stage: default_stage(),
            kind: StoreKind::default(),
            base_path: None,
        }
    }
}

/// Store backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// In-memory store (tests, dry runs)
    #[default]
    Memory,
    /// JSON files under `base_path`
    File,
}

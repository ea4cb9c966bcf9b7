//! LayoutVariant - closed set of on-disk pose-detection output layouts.
//!
//! A configuration choice, never auto-detected. Adding a variant is a
//! compile-time-checked change: every `match` over this enum must be
//! exhaustive.

use serde::{Deserialize, Serialize};

/// On-disk layout of the upstream pose-detection output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutVariant {
    /// One JSON file per captured frame, sequence number in the filename
    /// (`poses-{index}.json`).
    FilePerFrame,

    /// One JSON file holding all frames for the window
    /// (`alphapose-results.json`).
    FilePerSegment,
}

impl LayoutVariant {
    /// Subdirectory under the base directory that holds this layout's tree.
    pub fn subdirectory(&self) -> &'static str {
        match self {
            LayoutVariant::FilePerFrame => "poses_2d",
            LayoutVariant::FilePerSegment => "prepared",
        }
    }

    /// Fixed output file name for file-per-segment layouts.
    pub fn segment_file_name(&self) -> Option<&'static str> {
        match self {
            LayoutVariant::FilePerFrame => None,
            LayoutVariant::FilePerSegment => Some("alphapose-results.json"),
        }
    }

    /// Frame file name for file-per-frame layouts.
    pub fn frame_file_name(&self, frame_index: u32) -> Option<String> {
        match self {
            LayoutVariant::FilePerFrame => Some(format!("poses-{frame_index}.json")),
            LayoutVariant::FilePerSegment => None,
        }
    }
}

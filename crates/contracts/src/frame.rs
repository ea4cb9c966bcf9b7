//! Frame - FrameFileParser output
//!
//! One captured frame of pose detections, window-local until the
//! reconciler assigns its absolute timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CameraId, TimeWindow};

/// A single captured frame of pose detections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Camera that captured the frame
    pub camera_id: CameraId,

    /// Window the frame currently belongs to (may advance on carryover)
    pub window: TimeWindow,

    /// Zero-based, window-local sequence number (drift-corrected in place
    /// by the reconciler)
    pub sequence_number: u32,

    /// Corrected absolute timestamp; `None` until reconciled
    pub timestamp: Option<DateTime<Utc>>,

    /// Pose detections in this frame
    pub detections: Vec<Detection>,
}

impl Frame {
    /// Record identity used for store de-duplication.
    ///
    /// Corrected timestamps are deterministic for a given input tree, so
    /// re-processing a window produces colliding identities.
    pub fn identity(&self) -> Option<(CameraId, DateTime<Utc>)> {
        self.timestamp.map(|ts| (self.camera_id.clone(), ts))
    }
}

/// One detected person within a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Keypoints in model order; `None` marks a keypoint the detector
    /// could not place. Never encoded as a literal zero triple - zero is
    /// a valid pixel coordinate.
    pub keypoints: Vec<Option<Keypoint>>,

    /// Two-corner bounding box
    pub bounding_box: BoundingBox,

    /// Overall detection quality score
    pub quality: f64,
}

/// A single keypoint with its per-point quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub quality: f64,
}

/// Axis-aligned bounding box given as two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2,
    pub max: Point2,
}

/// 2D pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

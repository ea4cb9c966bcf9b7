//! Raw on-disk payload schema.
//!
//! Keypoints arrive as a flat `[x, y, q, x, y, q, ...]` array. A triple
//! with any zero component is the detector's marker for an unplaceable
//! keypoint and is surfaced as `None`; downstream code never sees the
//! zero sentinel.

use chrono::{DateTime, Utc};
use contracts::{BoundingBox, Detection, Keypoint, PipelineError, Point2};
use serde::Deserialize;

/// One detection record inside a segment file.
#[derive(Debug, Deserialize)]
pub struct RawSegmentEntry {
    /// Source image name, `{frame index}.jpg`
    pub image_id: String,
    #[serde(flatten)]
    pub detection: RawDetection,
    #[serde(flatten)]
    pub provenance: RawProvenance,
}

/// One frame file.
#[derive(Debug, Deserialize)]
pub struct RawFramePayload {
    #[serde(default)]
    pub detections: Vec<RawDetection>,
    #[serde(flatten)]
    pub provenance: RawProvenance,
}

/// Optional self-describing fields embedded in payloads.
///
/// When present they must agree with the path the file was found under.
#[derive(Debug, Default, Deserialize)]
pub struct RawProvenance {
    pub camera: Option<String>,
    pub environment: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RawDetection {
    pub keypoints: Vec<f64>,
    #[serde(rename = "box")]
    pub bounding_box: [f64; 4],
    pub score: f64,
}

impl RawSegmentEntry {
    /// Frame index from the `image_id` field.
    pub fn frame_index(&self, path: &str) -> Result<u32, PipelineError> {
        self.image_id
            .strip_suffix(".jpg")
            .and_then(|stem| stem.parse().ok())
            .ok_or_else(|| {
                PipelineError::parse(path, format!("malformed image_id '{}'", self.image_id))
            })
    }
}

impl RawDetection {
    /// Reshape the flat keypoint array and apply the zero sentinel.
    pub fn into_detection(self, path: &str) -> Result<Detection, PipelineError> {
        if self.keypoints.len() % 3 != 0 {
            return Err(PipelineError::parse(
                path,
                format!(
                    "keypoint array length {} is not a multiple of 3",
                    self.keypoints.len()
                ),
            ));
        }

        let keypoints = self
            .keypoints
            .chunks_exact(3)
            .map(|triple| keypoint_from_triple(triple[0], triple[1], triple[2]))
            .collect();

        let [x1, y1, x2, y2] = self.bounding_box;
        Ok(Detection {
            keypoints,
            bounding_box: BoundingBox {
                min: Point2 { x: x1, y: y1 },
                max: Point2 { x: x2, y: y2 },
            },
            quality: self.score,
        })
    }
}

/// The single place where the zero sentinel is interpreted.
fn keypoint_from_triple(x: f64, y: f64, quality: f64) -> Option<Keypoint> {
    if x == 0.0 || y == 0.0 || quality == 0.0 {
        return None;
    }
    Some(Keypoint { x, y, quality })
}

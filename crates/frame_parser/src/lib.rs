//! # Frame Parser
//!
//! Turns raw pose output files into [`Frame`] values.
//!
//! Two payload shapes exist:
//! - file-per-segment: one JSON array covering a whole window, each entry
//!   tagged with the source image it was detected in
//! - file-per-frame: one JSON object per frame
//!
//! Payloads may embed their own camera / environment / timestamp. Those
//! are cross-checked against the path-derived values and a mismatch is a
//! [`PipelineError::DataIntegrity`] - mislabeled input is never silently
//! accepted.

mod payload;

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use contracts::{CameraId, Detection, Frame, PipelineError, TimeWindow};
use payload::{RawFramePayload, RawProvenance, RawSegmentEntry};
use tracing::trace;

/// Stateless payload parser for one environment.
#[derive(Debug, Clone)]
pub struct FrameParser {
    environment_id: String,
    frame_period: TimeDelta,
}

impl FrameParser {
    pub fn new(environment_id: impl Into<String>, frame_period: TimeDelta) -> Self {
        Self {
            environment_id: environment_id.into(),
            frame_period,
        }
    }

    /// Parse a file-per-segment payload into the frames it mentions.
    ///
    /// Frames come back sorted by sequence number. Only frames that appear
    /// in the payload are produced; contiguity is the reconciler's concern.
    pub fn parse_segment_file(
        &self,
        camera: &CameraId,
        window: &TimeWindow,
        path: &str,
        content: &str,
    ) -> Result<Vec<Frame>, PipelineError> {
        let entries: Vec<RawSegmentEntry> = serde_json::from_str(content)
            .map_err(|e| PipelineError::parse(path, e.to_string()))?;

        let mut by_index: BTreeMap<u32, Vec<Detection>> = BTreeMap::new();
        for entry in entries {
            let index = entry.frame_index(path)?;
            self.check_provenance(camera, window, index, &entry.provenance)?;
            by_index
                .entry(index)
                .or_default()
                .push(entry.detection.into_detection(path)?);
        }

        trace!(path, frames = by_index.len(), "parsed segment file");

        Ok(by_index
            .into_iter()
            .map(|(index, detections)| Frame {
                camera_id: camera.clone(),
                window: *window,
                sequence_number: index,
                timestamp: None,
                detections,
            })
            .collect())
    }

    /// Parse a single file-per-frame payload.
    pub fn parse_frame_file(
        &self,
        camera: &CameraId,
        window: &TimeWindow,
        frame_index: u32,
        path: &str,
        content: &str,
    ) -> Result<Frame, PipelineError> {
        let raw: RawFramePayload = serde_json::from_str(content)
            .map_err(|e| PipelineError::parse(path, e.to_string()))?;

        self.check_provenance(camera, window, frame_index, &raw.provenance)?;

        let detections = raw
            .detections
            .into_iter()
            .map(|d| d.into_detection(path))
            .collect::<Result<_, _>>()?;

        Ok(Frame {
            camera_id: camera.clone(),
            window: *window,
            sequence_number: frame_index,
            timestamp: None,
            detections,
        })
    }

    /// Nominal capture instant of a raw frame, before drift correction.
    fn nominal_timestamp(&self, window: &TimeWindow, frame_index: u32) -> DateTime<Utc> {
        window.start + self.frame_period * (frame_index as i32)
    }

    fn check_provenance(
        &self,
        camera: &CameraId,
        window: &TimeWindow,
        frame_index: u32,
        provenance: &RawProvenance,
    ) -> Result<(), PipelineError> {
        if let Some(embedded) = &provenance.camera {
            if embedded.as_str() != camera.as_ref() {
                return Err(PipelineError::data_integrity(
                    "camera",
                    camera.as_ref(),
                    embedded,
                ));
            }
        }

        if let Some(embedded) = &provenance.environment {
            if *embedded != self.environment_id {
                return Err(PipelineError::data_integrity(
                    "environment",
                    &self.environment_id,
                    embedded,
                ));
            }
        }

        if let Some(embedded) = provenance.timestamp {
            let expected = self.nominal_timestamp(window, frame_index);
            if embedded != expected {
                return Err(PipelineError::data_integrity(
                    "timestamp",
                    expected.to_rfc3339(),
                    embedded.to_rfc3339(),
                ));
            }
        }

        Ok(())
    }
}

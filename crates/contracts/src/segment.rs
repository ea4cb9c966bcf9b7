//! ReconciledSegment - DriftReconciler output
//!
//! Terminal, immutable once produced.

use serde::{Deserialize, Serialize};

use crate::{CameraId, Frame, TimeWindow};

/// One camera's reconciled frames for one window, ordered by corrected
/// timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledSegment {
    /// Camera the segment belongs to
    pub camera_id: CameraId,

    /// Window the segment covers
    pub window: TimeWindow,

    /// Frames sorted by corrected timestamp; every frame has
    /// `timestamp = Some(..)`
    pub frames: Vec<Frame>,
}

impl ReconciledSegment {
    /// Verify the strictly non-decreasing timestamp invariant.
    pub fn is_sorted(&self) -> bool {
        self.frames
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    #[test]
    fn test_is_sorted() {
        let window = TimeWindow::containing(
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
            TimeDelta::seconds(10),
        );
        let frame = |offset_ms: i64| Frame {
            camera_id: "cam1".into(),
            window,
            sequence_number: 0,
            timestamp: Some(window.start + TimeDelta::milliseconds(offset_ms)),
            detections: vec![],
        };

        let sorted = ReconciledSegment {
            camera_id: "cam1".into(),
            window,
            frames: vec![frame(0), frame(100), frame(200)],
        };
        assert!(sorted.is_sorted());

        let unsorted = ReconciledSegment {
            camera_id: "cam1".into(),
            window,
            frames: vec![frame(100), frame(0)],
        };
        assert!(!unsorted.is_sorted());
    }
}

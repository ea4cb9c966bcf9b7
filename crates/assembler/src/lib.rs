//! # Segment Assembler
//!
//! Persists reconciled segments through a [`SegmentStore`].
//!
//! Writes are read-merge-write: the segment already persisted under the
//! key (if any) is merged with the incoming one by record identity
//! `(camera, corrected timestamp)`, last write wins. Re-running a range
//! therefore converges instead of duplicating.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::{CameraId, PipelineError, ReconciledSegment, SegmentStore, StoreKey, TimeWindow};
use metrics::counter;
use tracing::{debug, warn};

/// Writes segments for one processing run.
///
/// The store sits behind a mutex shared across camera tasks; the lock is
/// held for the whole read-merge-write so concurrent appends to the same
/// key cannot lose frames.
pub struct SegmentAssembler<S> {
    store: Arc<tokio::sync::Mutex<S>>,
    stage: String,
    environment_id: String,
    run_id: String,
}

impl<S: SegmentStore> SegmentAssembler<S> {
    pub fn new(
        store: Arc<tokio::sync::Mutex<S>>,
        stage: impl Into<String>,
        environment_id: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            stage: stage.into(),
            environment_id: environment_id.into(),
            run_id: run_id.into(),
        }
    }

    /// Store key addressing `window` for `camera` within this run.
    pub fn key_for(&self, camera: &CameraId, window: &TimeWindow) -> StoreKey {
        StoreKey {
            stage: self.stage.clone(),
            environment_id: self.environment_id.clone(),
            camera_id: camera.clone(),
            run_id: self.run_id.clone(),
            window_start: Some(window.start),
        }
    }

    /// Merge `segment` into whatever is already persisted for its window.
    ///
    /// Returns the persisted frame count after the merge. An empty
    /// segment is a no-op.
    pub async fn append(&self, segment: ReconciledSegment) -> Result<usize, PipelineError> {
        if segment.frames.is_empty() {
            debug!(window = %segment.window, "skipping empty segment");
            return Ok(0);
        }

        let key = self.key_for(&segment.camera_id, &segment.window);
        let mut store = self.store.lock().await;
        let existing = store.get(&key).await?;
        let merged = merge_segments(existing, segment);
        let count = merged.frames.len();

        counter!("assembler_segments_written_total", "store" => store.name().to_owned())
            .increment(1);
        counter!("assembler_frames_persisted_total", "store" => store.name().to_owned())
            .increment(count as u64);

        store.put(&key, merged).await?;
        Ok(count)
    }
}

/// Merge two segments for the same (camera, window) by record identity.
///
/// Incoming frames replace existing frames with the same corrected
/// timestamp; the result is sorted by timestamp.
pub fn merge_segments(
    existing: Option<ReconciledSegment>,
    incoming: ReconciledSegment,
) -> ReconciledSegment {
    let camera_id = incoming.camera_id.clone();
    let window = incoming.window;

    let mut by_timestamp: BTreeMap<DateTime<Utc>, contracts::Frame> = BTreeMap::new();
    let frames = existing
        .into_iter()
        .flat_map(|s| s.frames)
        .chain(incoming.frames);
    for frame in frames {
        match frame.timestamp {
            Some(ts) => {
                by_timestamp.insert(ts, frame);
            }
            None => {
                warn!(camera = %frame.camera_id, "discarding frame without corrected timestamp");
            }
        }
    }

    ReconciledSegment {
        camera_id,
        window,
        frames: by_timestamp.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use contracts::{CameraId, Frame};

    fn window() -> TimeWindow {
        TimeWindow {
            start: Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
            width: TimeDelta::seconds(10),
        }
    }

    fn frame_for(camera: &str, seq: u32, offset_ms: i64, detections: usize) -> Frame {
        Frame {
            camera_id: CameraId::from(camera),
            window: window(),
            sequence_number: seq,
            timestamp: Some(window().start + TimeDelta::milliseconds(offset_ms)),
            detections: vec![
                contracts::Detection {
                    keypoints: vec![],
                    bounding_box: contracts::BoundingBox {
                        min: contracts::Point2::default(),
                        max: contracts::Point2::default(),
                    },
                    quality: 0.5,
                };
                detections
            ],
        }
    }

    fn frame(seq: u32, offset_ms: i64, detections: usize) -> Frame {
        frame_for("cam-a", seq, offset_ms, detections)
    }

    fn segment(frames: Vec<Frame>) -> ReconciledSegment {
        segment_for("cam-a", frames)
    }

    fn segment_for(camera: &str, frames: Vec<Frame>) -> ReconciledSegment {
        ReconciledSegment {
            camera_id: CameraId::from(camera),
            window: window(),
            frames,
        }
    }

    #[test]
    fn test_merge_into_empty() {
        let merged = merge_segments(None, segment(vec![frame(0, 0, 1), frame(1, 100, 1)]));
        assert_eq!(merged.frames.len(), 2);
        assert!(merged.is_sorted());
    }

    #[test]
    fn test_merge_last_write_wins() {
        let existing = segment(vec![frame(0, 0, 1)]);
        let incoming = segment(vec![frame(0, 0, 3)]);
        let merged = merge_segments(Some(existing), incoming);

        assert_eq!(merged.frames.len(), 1);
        assert_eq!(merged.frames[0].detections.len(), 3);
    }

    #[test]
    fn test_merge_interleaves_sorted() {
        let existing = segment(vec![frame(0, 0, 1), frame(2, 200, 1)]);
        let incoming = segment(vec![frame(1, 100, 1)]);
        let merged = merge_segments(Some(existing), incoming);

        let offsets: Vec<_> = merged
            .frames
            .iter()
            .map(|f| (f.timestamp.unwrap() - window().start).num_milliseconds())
            .collect();
        assert_eq!(offsets, vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn test_append_is_idempotent() {
        let store = Arc::new(tokio::sync::Mutex::new(MemoryStore::new()));
        let assembler = SegmentAssembler::new(
            Arc::clone(&store),
            "pose_reconciliation_2d",
            "greenbrier",
            "run-1",
        );

        let seg = segment(vec![frame(0, 0, 1), frame(1, 100, 1)]);
        assert_eq!(assembler.append(seg.clone()).await.unwrap(), 2);
        assert_eq!(assembler.append(seg).await.unwrap(), 2);

        let key = assembler.key_for(&CameraId::from("cam-a"), &window());
        let stored = store.lock().await.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.frames.len(), 2);
    }

    #[tokio::test]
    async fn test_cameras_keep_separate_segments_per_window() {
        let store = Arc::new(tokio::sync::Mutex::new(MemoryStore::new()));
        let assembler = SegmentAssembler::new(
            Arc::clone(&store),
            "pose_reconciliation_2d",
            "greenbrier",
            "run-1",
        );

        // Both cameras emit the same corrected timestamps for the window.
        assembler
            .append(segment_for(
                "cam-a",
                vec![frame_for("cam-a", 0, 0, 1), frame_for("cam-a", 1, 100, 1)],
            ))
            .await
            .unwrap();
        assembler
            .append(segment_for(
                "cam-b",
                vec![frame_for("cam-b", 0, 0, 1), frame_for("cam-b", 1, 100, 1)],
            ))
            .await
            .unwrap();

        let store = store.lock().await;
        for camera in ["cam-a", "cam-b"] {
            let key = assembler.key_for(&CameraId::from(camera), &window());
            let stored = store.get(&key).await.unwrap().unwrap();
            assert_eq!(stored.frames.len(), 2, "{camera} segment");
            assert!(stored.frames.iter().all(|f| f.camera_id == camera));
        }
    }

    #[tokio::test]
    async fn test_append_empty_segment_writes_nothing() {
        let store = Arc::new(tokio::sync::Mutex::new(MemoryStore::new()));
        let assembler =
            SegmentAssembler::new(Arc::clone(&store), "stage", "greenbrier", "run-1");

        assert_eq!(assembler.append(segment(vec![])).await.unwrap(), 0);
        assert!(store.lock().await.is_empty());
    }
}

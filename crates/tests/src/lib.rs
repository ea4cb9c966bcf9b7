//! # Integration Tests
//!
//! End-to-end tests over the full reconciliation path:
//! discovery -> parsing -> drift correction -> persistence.

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_blueprint_defaults_drive_reconciliation() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[data]
environment_id = "greenbrier"
layout = "file-per-segment"
cameras = ["cam-a"]
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(blueprint.timing.nominal_frames(), 100);
        assert_eq!(
            blueprint.timing.frame_period(),
            chrono::TimeDelta::milliseconds(100)
        );
        assert!(blueprint.timing.adjust_timestamps);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use assembler::{MemoryStore, SegmentAssembler};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use contracts::{
        CameraId, CarryoverState, Frame, LayoutVariant, PipelineError, SegmentStore, StoreFilter,
        StoreKey, TimingConfig,
    };
    use frame_locator::{window, FrameLocator, MemVfs};
    use frame_parser::FrameParser;
    use reconciler::DriftReconciler;
    use serde_json::json;
    use tokio::sync::Mutex;

    const ENV: &str = "greenbrier";
    const STAGE: &str = "pose_reconciliation_2d";
    const RUN: &str = "run-test";

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, m, s).unwrap()
    }

    /// File-per-segment payload with `frames` frames, one detection each.
    fn segment_payload(frames: usize) -> String {
        let entries: Vec<_> = (0..frames)
            .map(|i| {
                json!({
                    "image_id": format!("{i}.jpg"),
                    "keypoints": [12.0, 34.0, 0.9, 56.0, 78.0, 0.7],
                    "box": [1.0, 1.0, 50.0, 120.0],
                    "score": 0.8,
                })
            })
            .collect();
        serde_json::to_string(&entries).unwrap()
    }

    fn segment_path(camera: &str, h: u32, m: u32, s: u32) -> String {
        format!(
            "/data/prepared/{ENV}/{camera}/2024/03/15/{h:02}-{m:02}-{s:02}/alphapose-results.json"
        )
    }

    fn frame_path(camera: &str, h: u32, m: u32, s: u32, index: u32) -> String {
        format!("/data/poses_2d/{ENV}/{camera}/2024/03/15/{h:02}-{m:02}-{s:02}/poses-{index}.json")
    }

    /// The per-camera fold, wired the way the CLI orchestrator wires it.
    struct Harness {
        layout: LayoutVariant,
        locator: FrameLocator<MemVfs>,
        parser: FrameParser,
        reconciler: DriftReconciler,
        store: Arc<Mutex<MemoryStore>>,
        assembler: SegmentAssembler<MemoryStore>,
    }

    impl Harness {
        fn new(layout: LayoutVariant, vfs: MemVfs) -> Self {
            let timing = TimingConfig::default();
            let store = Arc::new(Mutex::new(MemoryStore::new()));
            Self {
                layout,
                locator: FrameLocator::with_vfs("/data", layout, ENV, vfs),
                parser: FrameParser::new(ENV, timing.frame_period()),
                reconciler: DriftReconciler::new(&timing),
                store: Arc::clone(&store),
                assembler: SegmentAssembler::new(store, STAGE, ENV, RUN),
            }
        }

        async fn process_range(
            &self,
            camera: &CameraId,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<CarryoverState, PipelineError> {
            let mut carry = self.reconciler.begin(camera.clone());

            for w in window::generate(start, end, TimeDelta::seconds(10)) {
                let observed = match self.locator.discover(camera, &w)? {
                    None if carry.pending.is_empty() => continue,
                    None => Vec::new(),
                    Some(listing) => {
                        let mut observed: Vec<Frame> = Vec::new();
                        for file in &listing.files {
                            let content = self.locator.read(file)?;
                            let path = file.path.display().to_string();
                            match self.layout {
                                LayoutVariant::FilePerSegment => observed.extend(
                                    self.parser.parse_segment_file(camera, &w, &path, &content)?,
                                ),
                                LayoutVariant::FilePerFrame => {
                                    observed.push(self.parser.parse_frame_file(
                                        camera,
                                        &w,
                                        file.frame_index.unwrap(),
                                        &path,
                                        &content,
                                    )?)
                                }
                            }
                        }
                        observed
                    }
                };

                let (segment, next_carry) = self.reconciler.reconcile(&w, observed, carry)?;
                self.assembler.append(segment).await?;
                carry = next_carry;
            }

            Ok(carry)
        }

        fn key_at(&self, camera: &str, h: u32, m: u32, s: u32) -> StoreKey {
            StoreKey {
                stage: STAGE.into(),
                environment_id: ENV.into(),
                camera_id: CameraId::from(camera),
                run_id: RUN.into(),
                window_start: Some(utc(h, m, s)),
            }
        }
    }

    #[tokio::test]
    async fn test_surplus_carries_into_next_window() {
        let mut vfs = MemVfs::new();
        vfs.insert(segment_path("cam-a", 10, 0, 0), segment_payload(105));
        vfs.insert(segment_path("cam-a", 10, 0, 10), segment_payload(98));

        let harness = Harness::new(LayoutVariant::FilePerSegment, vfs);
        let camera = CameraId::from("cam-a");
        let carry = harness
            .process_range(&camera, utc(10, 0, 0), utc(10, 0, 20))
            .await
            .unwrap();

        let store = harness.store.lock().await;
        let first = store
            .get(&harness.key_at("cam-a", 10, 0, 0))
            .await
            .unwrap()
            .unwrap();
        let second = store
            .get(&harness.key_at("cam-a", 10, 0, 10))
            .await
            .unwrap()
            .unwrap();

        // 105 -> emit 100, carry 5; 5 + 98 -> emit 100, carry 3.
        assert_eq!(first.frames.len(), 100);
        assert_eq!(second.frames.len(), 100);
        assert_eq!(carry.pending.len(), 3);
        assert_eq!(carry.drift_count, 3);

        // Timestamps are deterministic and gapless at 10 fps.
        assert_eq!(first.frames[0].timestamp, Some(utc(10, 0, 0)));
        assert_eq!(
            first.frames[99].timestamp,
            Some(utc(10, 0, 0) + TimeDelta::milliseconds(9_900))
        );
        assert_eq!(second.frames[0].timestamp, Some(utc(10, 0, 10)));
        assert!(first.is_sorted() && second.is_sorted());
    }

    #[tokio::test]
    async fn test_rerun_converges_without_duplicates() {
        let mut vfs = MemVfs::new();
        vfs.insert(segment_path("cam-a", 10, 0, 0), segment_payload(101));

        let harness = Harness::new(LayoutVariant::FilePerSegment, vfs);
        let camera = CameraId::from("cam-a");

        for _ in 0..2 {
            harness
                .process_range(&camera, utc(10, 0, 0), utc(10, 0, 10))
                .await
                .unwrap();
        }

        let store = harness.store.lock().await;
        assert_eq!(store.len(), 1);

        let segment = store
            .get(&harness.key_at("cam-a", 10, 0, 0))
            .await
            .unwrap()
            .unwrap();
        // 101 frames: one dropped as noise, and the rerun merges cleanly.
        assert_eq!(segment.frames.len(), 100);
        assert!(segment.is_sorted());

        let identities: std::collections::HashSet<_> = segment
            .frames
            .iter()
            .map(|f| f.identity().unwrap())
            .collect();
        assert_eq!(identities.len(), 100);
    }

    #[tokio::test]
    async fn test_windows_without_data_leave_no_record() {
        let mut vfs = MemVfs::new();
        vfs.insert(segment_path("cam-a", 10, 0, 0), segment_payload(100));
        // 10:00:10 missing entirely
        vfs.insert(segment_path("cam-a", 10, 0, 20), segment_payload(95));

        let harness = Harness::new(LayoutVariant::FilePerSegment, vfs);
        let camera = CameraId::from("cam-a");
        let carry = harness
            .process_range(&camera, utc(10, 0, 0), utc(10, 0, 30))
            .await
            .unwrap();

        let store = harness.store.lock().await;
        let keys = store.query(&StoreFilter::default()).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(store
            .get(&harness.key_at("cam-a", 10, 0, 10))
            .await
            .unwrap()
            .is_none());

        // The deficit window is persisted short, drift recorded.
        let third = store
            .get(&harness.key_at("cam-a", 10, 0, 20))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(third.frames.len(), 95);
        assert_eq!(carry.drift_count, -5);
    }

    #[tokio::test]
    async fn test_file_per_frame_layout() {
        let mut vfs = MemVfs::new();
        for index in 0..3u32 {
            vfs.insert(
                frame_path("cam-b", 10, 0, 0, index),
                json!({
                    "camera": "cam-b",
                    "environment": ENV,
                    "detections": [{
                        "keypoints": [5.0, 6.0, 0.9],
                        "box": [0.0, 0.0, 10.0, 10.0],
                        "score": 0.7,
                    }],
                })
                .to_string(),
            );
        }
        // Unrelated files are ignored by discovery
        vfs.insert(
            "/data/poses_2d/greenbrier/cam-b/2024/03/15/10-00-00/notes.txt",
            "ignored",
        );

        let harness = Harness::new(LayoutVariant::FilePerFrame, vfs);
        let camera = CameraId::from("cam-b");
        let carry = harness
            .process_range(&camera, utc(10, 0, 0), utc(10, 0, 10))
            .await
            .unwrap();

        let store = harness.store.lock().await;
        let segment = store
            .get(&harness.key_at("cam-a", 10, 0, 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(segment.frames.len(), 3);
        assert_eq!(segment.frames[0].detections.len(), 1);
        assert_eq!(carry.drift_count, -97);
    }

    #[tokio::test]
    async fn test_two_cameras_share_a_window_on_disk() {
        use assembler::FileStore;

        let data_dir = tempfile::tempdir().unwrap();
        let store_dir = tempfile::tempdir().unwrap();

        for camera in ["cam-a", "cam-b"] {
            let dir = data_dir
                .path()
                .join("prepared")
                .join(ENV)
                .join(camera)
                .join("2024/03/15/10-00-00");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("alphapose-results.json"), segment_payload(100)).unwrap();
        }

        let timing = TimingConfig::default();
        let locator = FrameLocator::new(data_dir.path(), LayoutVariant::FilePerSegment, ENV);
        let parser = FrameParser::new(ENV, timing.frame_period());
        let reconciler = DriftReconciler::new(&timing);
        let store = Arc::new(Mutex::new(FileStore::new(store_dir.path())));
        let assembler = SegmentAssembler::new(Arc::clone(&store), STAGE, ENV, RUN);

        let w = contracts::TimeWindow {
            start: utc(10, 0, 0),
            width: TimeDelta::seconds(10),
        };
        for camera in ["cam-a", "cam-b"] {
            let camera = CameraId::from(camera);
            let listing = locator.discover(&camera, &w).unwrap().unwrap();
            let mut observed: Vec<Frame> = Vec::new();
            for file in &listing.files {
                let content = locator.read(file).unwrap();
                let path = file.path.display().to_string();
                observed.extend(
                    parser
                        .parse_segment_file(&camera, &w, &path, &content)
                        .unwrap(),
                );
            }

            let carry = reconciler.begin(camera.clone());
            let (segment, _) = reconciler.reconcile(&w, observed, carry).unwrap();
            assembler.append(segment).await.unwrap();
        }

        // Identical corrected timestamps, separate keys: neither camera
        // overwrites the other.
        let store = store.lock().await;
        let keys = store.query(&StoreFilter::default()).await.unwrap();
        assert_eq!(keys.len(), 2);

        for camera in ["cam-a", "cam-b"] {
            let key = assembler.key_for(&CameraId::from(camera), &w);
            let segment = store.get(&key).await.unwrap().unwrap();
            assert_eq!(segment.frames.len(), 100);
            assert!(segment.frames.iter().all(|f| f.camera_id == camera));
            assert_eq!(segment.frames[0].timestamp, Some(utc(10, 0, 0)));
        }
    }

    #[tokio::test]
    async fn test_mislabeled_payload_aborts_range() {
        let entries = json!([{
            "image_id": "0.jpg",
            "keypoints": [1.0, 2.0, 0.9],
            "box": [0.0, 0.0, 1.0, 1.0],
            "score": 0.5,
            "environment": "other-site",
        }]);
        let mut vfs = MemVfs::new();
        vfs.insert(segment_path("cam-a", 10, 0, 0), entries.to_string());

        let harness = Harness::new(LayoutVariant::FilePerSegment, vfs);
        let camera = CameraId::from("cam-a");
        let err = harness
            .process_range(&camera, utc(10, 0, 0), utc(10, 0, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::DataIntegrity { .. }));
        assert!(harness.store.lock().await.is_empty());
    }
}

//! Complete Pipeline Demo
//!
//! Generates a synthetic pose output tree with drifting frame counts,
//! then runs discovery, parsing, drift reconciliation, and persistence
//! over it and prints what the store ends up holding.
//!
//! Run with: cargo run --bin demo_pipeline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assembler::{MemoryStore, SegmentAssembler};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{CameraId, Frame, LayoutVariant, SegmentStore, StoreFilter, TimeWindow};
use frame_locator::{window, FrameLocator};
use frame_parser::FrameParser;
use reconciler::DriftReconciler;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const CAMERA: &str = "cam-demo";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Pose Ingest Demo");

    // ==== Stage 1: Generate a synthetic output tree ====
    let base_dir = std::env::temp_dir().join("pose-ingest-demo");
    let start = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
    // 105, 98 and 101 frames: surplus carry, deficit, single-frame noise
    let frame_counts = [105usize, 98, 101];
    generate_tree(&base_dir, start, &frame_counts)?;
    info!(base_dir = %base_dir.display(), "Synthetic tree generated");

    // ==== Stage 2: Load configuration ====
    let config = format!(
        r#"
[data]
base_dir = "{}"
environment_id = "demo-env"
layout = "file-per-segment"
cameras = ["{CAMERA}"]
"#,
        base_dir.display()
    );
    let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml)?;
    info!(
        nominal_frames = blueprint.timing.nominal_frames(),
        "Blueprint loaded"
    );

    // ==== Stage 3: Wire the fold ====
    let locator = FrameLocator::new(
        blueprint.data.base_dir.clone(),
        blueprint.data.layout,
        blueprint.data.environment_id.clone(),
    );
    let parser = FrameParser::new(
        blueprint.data.environment_id.clone(),
        blueprint.timing.frame_period(),
    );
    let reconciler = DriftReconciler::new(&blueprint.timing);
    let store = Arc::new(tokio::sync::Mutex::new(MemoryStore::new()));
    let assembler = SegmentAssembler::new(
        Arc::clone(&store),
        blueprint.store.stage.clone(),
        blueprint.data.environment_id.clone(),
        "demo-run",
    );

    // ==== Stage 4: Fold the range window by window ====
    let camera = CameraId::from(CAMERA);
    let end = start + TimeDelta::seconds(10 * frame_counts.len() as i64);
    let mut carry = reconciler.begin(camera.clone());

    for w in window::generate(start, end, blueprint.timing.segment_width()) {
        let observed = collect_observed(&locator, &parser, &camera, &w)?;
        let raw_count = observed.len();

        let (segment, next_carry) = reconciler.reconcile(&w, observed, carry)?;
        info!(
            window = %w,
            raw = raw_count,
            emitted = segment.frames.len(),
            carried = next_carry.pending.len(),
            drift = next_carry.drift_count,
            "Window reconciled"
        );

        assembler.append(segment).await?;
        carry = next_carry;
    }

    // ==== Stage 5: Inspect the store ====
    let store = store.lock().await;
    let keys = store.query(&StoreFilter::default()).await?;
    println!("\n=== Store Contents ===");
    for key in keys {
        if let Some(segment) = store.get(&key).await? {
            println!(
                "  {} -> {} frames (first ts {:?})",
                key.window_start.unwrap(),
                segment.frames.len(),
                segment.frames.first().and_then(|f| f.timestamp)
            );
        }
    }

    std::fs::remove_dir_all(&base_dir).ok();
    info!("Demo finished");
    Ok(())
}

fn collect_observed(
    locator: &FrameLocator,
    parser: &FrameParser,
    camera: &CameraId,
    w: &TimeWindow,
) -> Result<Vec<Frame>, Box<dyn std::error::Error>> {
    let Some(listing) = locator.discover(camera, w)? else {
        return Ok(Vec::new());
    };

    let mut observed = Vec::new();
    for file in &listing.files {
        let content = locator.read(file)?;
        let path = file.path.display().to_string();
        observed.extend(parser.parse_segment_file(camera, w, &path, &content)?);
    }
    Ok(observed)
}

/// Write one segment file per window with the requested frame counts.
fn generate_tree(
    base_dir: &Path,
    start: DateTime<Utc>,
    frame_counts: &[usize],
) -> std::io::Result<()> {
    for (i, count) in frame_counts.iter().enumerate() {
        let window_start = start + TimeDelta::seconds(10 * i as i64);
        let dir = segment_dir(base_dir, window_start);
        std::fs::create_dir_all(&dir)?;

        let entries: Vec<_> = (0..*count)
            .map(|index| {
                json!({
                    "image_id": format!("{index}.jpg"),
                    "keypoints": [120.5, 88.0, 0.91, 132.0, 96.5, 0.84],
                    "box": [100.0, 80.0, 180.0, 240.0],
                    "score": 0.87,
                })
            })
            .collect();
        std::fs::write(
            dir.join("alphapose-results.json"),
            serde_json::to_vec(&entries)?,
        )?;
    }
    Ok(())
}

fn segment_dir(base_dir: &Path, window_start: DateTime<Utc>) -> PathBuf {
    base_dir
        .join(LayoutVariant::FilePerSegment.subdirectory())
        .join("demo-env")
        .join(CAMERA)
        .join(window_start.format("%Y/%m/%d/%H-%M-%S").to_string())
}

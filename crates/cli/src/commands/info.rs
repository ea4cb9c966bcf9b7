//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    data: DataInfo,
    timing: TimingInfo,
    store: StoreInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    discovery_patterns: Vec<CameraPattern>,
}

#[derive(Serialize)]
struct DataInfo {
    base_dir: String,
    environment_id: String,
    layout: String,
    cameras: Vec<String>,
}

#[derive(Serialize)]
struct TimingInfo {
    sampling_rate_hz: u32,
    segment_duration_s: u32,
    batch_duration_s: u32,
    nominal_frames: usize,
    adjust_timestamps: bool,
}

#[derive(Serialize)]
struct StoreInfo {
    stage: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_path: Option<String>,
}

#[derive(Serialize)]
struct CameraPattern {
    camera: String,
    pattern: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn discovery_patterns(blueprint: &contracts::PipelineBlueprint) -> Vec<CameraPattern> {
    blueprint
        .data
        .cameras
        .iter()
        .map(|camera| CameraPattern {
            camera: camera.clone(),
            pattern: frame_locator::glob_pattern(
                &blueprint.data.base_dir,
                blueprint.data.layout,
                &frame_locator::GlobSpec {
                    environment_id: Some(blueprint.data.environment_id.as_str()),
                    camera_id: Some(camera.as_str()),
                    file_name: blueprint.data.layout.segment_file_name(),
                    ..Default::default()
                },
            ),
        })
        .collect()
}

fn build_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) -> ConfigInfo {
    let discovery_patterns = if args.patterns {
        discovery_patterns(blueprint)
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        data: DataInfo {
            base_dir: blueprint.data.base_dir.display().to_string(),
            environment_id: blueprint.data.environment_id.clone(),
            layout: format!("{:?}", blueprint.data.layout),
            cameras: blueprint.data.cameras.clone(),
        },
        timing: TimingInfo {
            sampling_rate_hz: blueprint.timing.sampling_rate_hz,
            segment_duration_s: blueprint.timing.segment_duration_s,
            batch_duration_s: blueprint.timing.batch_duration_s,
            nominal_frames: blueprint.timing.nominal_frames(),
            adjust_timestamps: blueprint.timing.adjust_timestamps,
        },
        store: StoreInfo {
            stage: blueprint.store.stage.clone(),
            kind: format!("{:?}", blueprint.store.kind),
            base_path: blueprint
                .store
                .base_path
                .as_ref()
                .map(|p| p.display().to_string()),
        },
        discovery_patterns,
    }
}

fn print_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Pose Ingest Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Data source
    println!("📍 Data");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Base dir: {}", blueprint.data.base_dir.display());
    println!("   ├─ Environment: {}", blueprint.data.environment_id);
    println!("   └─ Layout: {:?}", blueprint.data.layout);

    // Cameras
    if blueprint.data.cameras.is_empty() {
        println!("\n📷 Cameras: (discovered from disk at run time)");
    } else {
        println!("\n📷 Cameras ({})", blueprint.data.cameras.len());
        for (i, camera) in blueprint.data.cameras.iter().enumerate() {
            let is_last = i == blueprint.data.cameras.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {}", prefix, camera);
        }
    }

    // Timing
    let timing = &blueprint.timing;
    println!("\n⚙️  Timing");
    println!("   ├─ Sampling rate: {} Hz", timing.sampling_rate_hz);
    println!("   ├─ Segment: {} s", timing.segment_duration_s);
    println!("   ├─ Batch: {} s", timing.batch_duration_s);
    println!("   ├─ Nominal frames/window: {}", timing.nominal_frames());
    println!("   └─ Adjust timestamps: {}", timing.adjust_timestamps);

    // Store
    println!("\n📤 Store");
    println!("   ├─ Stage: {}", blueprint.store.stage);
    match &blueprint.store.base_path {
        Some(path) => {
            println!("   ├─ Kind: {:?}", blueprint.store.kind);
            println!("   └─ Base path: {}", path.display());
        }
        None => {
            println!("   └─ Kind: {:?}", blueprint.store.kind);
        }
    }

    // Discovery patterns
    if args.patterns && !blueprint.data.cameras.is_empty() {
        println!("\n🔍 Discovery Patterns");
        let patterns = discovery_patterns(blueprint);
        for (i, entry) in patterns.iter().enumerate() {
            let is_last = i == patterns.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {}: {}", prefix, entry.camera, entry.pattern);
        }
    }

    println!();
}

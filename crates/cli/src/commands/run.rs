//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if !args.cameras.is_empty() {
        info!(cameras = ?args.cameras, "Overriding camera list from CLI");
        blueprint.data.cameras = args.cameras.clone();
    }

    if args.end <= args.start {
        anyhow::bail!(
            "End of range ({}) must be after its start ({})",
            args.end,
            args.start
        );
    }

    info!(
        environment = %blueprint.data.environment_id,
        layout = ?blueprint.data.layout,
        cameras = blueprint.data.cameras.len(),
        start = %args.start,
        end = %args.end,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        start: args.start,
        end: args.end,
        run_id: args.run_id.clone(),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    info!("Starting pipeline...");

    let stats = pipeline.run().await.context("Pipeline execution failed")?;

    info!(
        windows_processed = stats.windows_processed,
        frames_persisted = stats.frames_persisted,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );

    stats.print_summary();

    if !stats.camera_failures.is_empty() {
        for (camera, error) in &stats.camera_failures {
            warn!(camera = %camera, error = %error, "Camera aborted with error");
        }
        anyhow::bail!(
            "{} of {} cameras failed",
            stats.camera_failures.len(),
            stats.cameras_total
        );
    }

    info!("Pose Ingest finished");
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::PipelineBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Data:");
    println!("  Base dir: {}", blueprint.data.base_dir.display());
    println!("  Environment: {}", blueprint.data.environment_id);
    println!("  Layout: {:?}", blueprint.data.layout);

    if blueprint.data.cameras.is_empty() {
        println!("\nCameras: (discovered from disk)");
    } else {
        println!("\nCameras ({}):", blueprint.data.cameras.len());
        for camera in &blueprint.data.cameras {
            println!("  - {}", camera);
        }
    }

    println!("\nTiming:");
    println!(
        "  {} Hz, {} s segments, {} s batches, {} nominal frames",
        blueprint.timing.sampling_rate_hz,
        blueprint.timing.segment_duration_s,
        blueprint.timing.batch_duration_s,
        blueprint.timing.nominal_frames()
    );
    println!("  Adjust timestamps: {}", blueprint.timing.adjust_timestamps);

    println!("\nStore:");
    println!(
        "  {} ({:?})",
        blueprint.store.stage, blueprint.store.kind
    );

    println!();
}

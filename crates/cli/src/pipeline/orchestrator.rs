//! Pipeline orchestrator - coordinates all components.
//!
//! One task per camera folds that camera's windows in strict time order,
//! threading the carryover state; cameras never share state, so they run
//! concurrently against a shared store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use assembler::{FileStore, MemoryStore, SegmentAssembler};
use chrono::{DateTime, Utc};
use contracts::{
    align_down, CameraId, CarryoverState, Frame, LayoutVariant, PipelineBlueprint, PipelineError,
    SegmentStore, StoreKind, TimeWindow,
};
use frame_locator::{window, FrameLocator, OsVfs, WindowListing};
use frame_parser::FrameParser;
use observability::{RunSummary, WindowOutcome};
use reconciler::DriftReconciler;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The pipeline blueprint configuration
    pub blueprint: PipelineBlueprint,

    /// Start of the processed range
    pub start: DateTime<Utc>,

    /// End of the processed range, exclusive
    pub end: DateTime<Utc>,

    /// Processing-run identifier (None = generated)
    pub run_id: Option<String>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let run_id = self
            .config
            .run_id
            .clone()
            .unwrap_or_else(generate_run_id);
        info!(run_id = %run_id, "Processing run");

        match self.config.blueprint.store.kind {
            StoreKind::Memory => self.run_with_store(MemoryStore::new(), run_id).await,
            StoreKind::File => {
                let base_path = self
                    .config
                    .blueprint
                    .store
                    .base_path
                    .clone()
                    .context("store.base_path is required for the file store")?;
                self.run_with_store(FileStore::new(base_path), run_id).await
            }
        }
    }

    async fn run_with_store<S>(self, store: S, run_id: String) -> Result<PipelineStats>
    where
        S: SegmentStore + Send + 'static,
    {
        let start_time = Instant::now();
        let blueprint = self.config.blueprint;
        let data = &blueprint.data;

        let locator = FrameLocator::new(
            data.base_dir.clone(),
            data.layout,
            data.environment_id.clone(),
        );

        // Resolve the camera list, falling back to on-disk discovery
        let cameras: Vec<CameraId> = if data.cameras.is_empty() {
            let discovered = locator.discover_cameras()?;
            info!(cameras = discovered.len(), "Discovered cameras from disk");
            discovered
        } else {
            data.cameras.iter().map(|c| CameraId::from(c.as_str())).collect()
        };

        let mut stats = PipelineStats {
            run_id: run_id.clone(),
            cameras_total: cameras.len(),
            ..Default::default()
        };

        if cameras.is_empty() {
            warn!("No cameras to process");
            stats.duration = start_time.elapsed();
            return Ok(stats);
        }

        // Shutdown flag, checked between windows only so a window is
        // never half-processed
        let shutdown = Arc::new(AtomicBool::new(false));
        tokio::spawn(watch_shutdown_signal(Arc::clone(&shutdown)));

        let store = Arc::new(tokio::sync::Mutex::new(store));
        let mut join_set = JoinSet::new();

        for camera in cameras {
            let worker = CameraWorker {
                camera: camera.clone(),
                layout: data.layout,
                locator: locator.clone(),
                parser: FrameParser::new(
                    data.environment_id.clone(),
                    blueprint.timing.frame_period(),
                ),
                reconciler: DriftReconciler::new(&blueprint.timing),
                assembler: SegmentAssembler::new(
                    Arc::clone(&store),
                    blueprint.store.stage.clone(),
                    data.environment_id.clone(),
                    run_id.clone(),
                ),
                start: self.config.start,
                end: self.config.end,
                segment_width: blueprint.timing.segment_width(),
                batch_width: blueprint.timing.batch_width(),
                shutdown: Arc::clone(&shutdown),
            };

            join_set.spawn(async move {
                let result = worker.run().await;
                (camera, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((camera, Ok(outcome))) => {
                    stats.windows_processed += outcome.windows_processed;
                    stats.windows_no_data += outcome.windows_no_data;
                    stats.frames_persisted += outcome.frames_persisted;
                    stats.summary.merge(outcome.summary);
                    debug!(camera = %camera, "Camera finished");
                }
                Ok((camera, Err(e))) => {
                    stats
                        .camera_failures
                        .push((camera.to_string(), e.to_string()));
                }
                Err(e) => {
                    stats
                        .camera_failures
                        .push(("<unknown>".to_string(), e.to_string()));
                }
            }
        }

        stats.duration = start_time.elapsed();
        Ok(stats)
    }
}

/// Per-camera fold state and collaborators.
struct CameraWorker<S> {
    camera: CameraId,
    layout: LayoutVariant,
    locator: FrameLocator<OsVfs>,
    parser: FrameParser,
    reconciler: DriftReconciler,
    assembler: SegmentAssembler<S>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    segment_width: chrono::TimeDelta,
    batch_width: chrono::TimeDelta,
    shutdown: Arc<AtomicBool>,
}

/// What one camera's fold produced.
#[derive(Debug, Default)]
struct CameraOutcome {
    windows_processed: u64,
    windows_no_data: u64,
    frames_persisted: u64,
    summary: RunSummary,
}

impl<S: SegmentStore> CameraWorker<S> {
    /// Fold every window of the range in strict time order.
    ///
    /// Any error aborts the remainder of this camera's range; other
    /// cameras are unaffected.
    async fn run(&self) -> Result<CameraOutcome, PipelineError> {
        let mut outcome = CameraOutcome::default();
        let mut carry = self.reconciler.begin(self.camera.clone());
        let mut current_batch: Option<DateTime<Utc>> = None;

        for window in window::generate(self.start, self.end, self.segment_width) {
            if self.shutdown.load(Ordering::Relaxed) {
                info!(camera = %self.camera, "Shutdown requested, stopping between windows");
                break;
            }

            let batch_start = align_down(window.start, self.batch_width);
            if current_batch != Some(batch_start) {
                current_batch = Some(batch_start);
                debug!(camera = %self.camera, batch = %batch_start, "Entering batch");
            }

            self.process_window(&window, &mut carry, &mut outcome)
                .await?;
        }

        if !carry.pending.is_empty() {
            warn!(
                camera = %self.camera,
                pending = carry.pending.len(),
                "Surplus frames remain past the end of the range; discarded"
            );
        }

        Ok(outcome)
    }

    async fn process_window(
        &self,
        window: &TimeWindow,
        carry: &mut CarryoverState,
        outcome: &mut CameraOutcome,
    ) -> Result<(), PipelineError> {
        let listing = self.locator.discover(&self.camera, window)?;

        let observed = match listing {
            None if carry.pending.is_empty() => {
                debug!(camera = %self.camera, window = %window, "No data for window");
                outcome.windows_no_data += 1;
                outcome.summary.record_no_data(&self.camera);
                return Ok(());
            }
            // Pending frames must still be flushed into this window
            None => Vec::new(),
            Some(listing) => self.parse_listing(window, &listing)?,
        };

        let state = std::mem::replace(carry, CarryoverState::empty(self.camera.clone()));
        let n_in = state.pending.len() + observed.len();

        let (segment, next_carry) = self.reconciler.reconcile(window, observed, state)?;

        let emitted = segment.frames.len();
        let carried = next_carry.pending.len();
        outcome.summary.record_window(
            &self.camera,
            WindowOutcome {
                emitted,
                dropped: n_in - emitted - carried,
                carried,
                drift: next_carry.drift_count,
            },
        );

        self.assembler.append(segment).await?;

        outcome.windows_processed += 1;
        outcome.frames_persisted += emitted as u64;
        *carry = next_carry;
        Ok(())
    }

    fn parse_listing(
        &self,
        window: &TimeWindow,
        listing: &WindowListing,
    ) -> Result<Vec<Frame>, PipelineError> {
        let mut observed = Vec::new();

        for file in &listing.files {
            let content = self.locator.read(file)?;
            let path = file.path.display().to_string();

            match self.layout {
                LayoutVariant::FilePerSegment => {
                    let frames =
                        self.parser
                            .parse_segment_file(&self.camera, window, &path, &content)?;
                    observed.extend(frames);
                }
                LayoutVariant::FilePerFrame => {
                    let Some(index) = file.frame_index else {
                        continue;
                    };
                    let frame = self.parser.parse_frame_file(
                        &self.camera,
                        window,
                        index,
                        &path,
                        &content,
                    )?;
                    observed.push(frame);
                }
            }
        }

        Ok(observed)
    }
}

/// Generated run identifiers are time-ordered and unique per process.
fn generate_run_id() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("run-{:x}-{:x}", nanos, std::process::id())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn watch_shutdown_signal(shutdown: Arc<AtomicBool>) {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => {
                warn!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Received shutdown signal, stopping after in-flight windows");
    shutdown.store(true, Ordering::Relaxed);
}

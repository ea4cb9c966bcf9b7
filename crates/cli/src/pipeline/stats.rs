//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::RunSummary;

/// Statistics from a pipeline run
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Processing-run identifier
    pub run_id: String,

    /// Number of cameras the run covered
    pub cameras_total: usize,

    /// Cameras that aborted, with the error that stopped them
    pub camera_failures: Vec<(String, String)>,

    /// Windows reconciled across all cameras
    pub windows_processed: u64,

    /// Windows with neither files on disk nor carried frames
    pub windows_no_data: u64,

    /// Frames written to the store
    pub frames_persisted: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Per-camera reconciliation aggregates
    pub summary: RunSummary,
}

impl PipelineStats {
    /// Windows reconciled per second of wall time
    pub fn windows_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.windows_processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let totals = self.summary.totals();

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Run id: {}", self.run_id);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Cameras: {}", self.cameras_total);
        println!("   ├─ Windows processed: {}", self.windows_processed);
        println!("   ├─ Windows without data: {}", self.windows_no_data);
        println!("   ├─ Windows/s: {:.2}", self.windows_per_second());
        println!("   └─ Frames persisted: {}", self.frames_persisted);

        println!("\n📈 Reconciliation");
        println!("   ├─ Frames emitted: {}", totals.frames_emitted);
        println!("   ├─ Frames dropped as noise: {}", totals.frames_dropped);
        println!("   └─ Frames carried forward: {}", totals.frames_carried);

        let drifting: Vec<_> = self
            .summary
            .cameras()
            .filter(|(_, s)| s.final_drift != 0)
            .collect();
        if !drifting.is_empty() {
            println!("\n⚠️  Residual Drift");
            for (i, (camera, summary)) in drifting.iter().enumerate() {
                let prefix = if i == drifting.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                println!(
                    "   {} {}: {:+} frames",
                    prefix, camera, summary.final_drift
                );
            }
        }

        if !self.camera_failures.is_empty() {
            println!("\n❌ Failed Cameras");
            for (i, (camera, error)) in self.camera_failures.iter().enumerate() {
                let prefix = if i == self.camera_failures.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                println!("   {} {}: {}", prefix, camera, error);
            }
        }

        println!();
    }
}

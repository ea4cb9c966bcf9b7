//! Metric descriptions and per-run aggregation.

use std::collections::BTreeMap;

use metrics::{describe_counter, describe_gauge, Unit};

/// Register descriptions for every metric the pipeline emits.
pub fn describe() {
    describe_counter!(
        "reconciler_windows_total",
        Unit::Count,
        "Windows reconciled per camera"
    );
    describe_counter!(
        "reconciler_frames_emitted_total",
        Unit::Count,
        "Frames emitted after drift correction"
    );
    describe_counter!(
        "reconciler_frames_dropped_total",
        Unit::Count,
        "Single-surplus frames dropped as sampling noise"
    );
    describe_counter!(
        "reconciler_frames_carried_total",
        Unit::Count,
        "Surplus frames carried into the following window"
    );
    describe_gauge!(
        "reconciler_drift_frames",
        Unit::Count,
        "Signed drift of the most recent window per camera"
    );
    describe_counter!(
        "assembler_segments_written_total",
        Unit::Count,
        "Segments persisted per store"
    );
    describe_counter!(
        "assembler_frames_persisted_total",
        Unit::Count,
        "Frames persisted per store"
    );
}

/// Per-camera counters for one window.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowOutcome {
    pub emitted: usize,
    pub dropped: usize,
    pub carried: usize,
    pub drift: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CameraSummary {
    pub windows: u64,
    pub windows_no_data: u64,
    pub frames_emitted: u64,
    pub frames_dropped: u64,
    pub frames_carried: u64,
    /// Drift left by the camera's last window
    pub final_drift: i64,
}

/// In-process aggregation for the end-of-run report. The Prometheus
/// exporter carries the live view; this struct exists so a run can print
/// totals without scraping itself.
#[derive(Debug, Default)]
pub struct RunSummary {
    cameras: BTreeMap<String, CameraSummary>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_window(&mut self, camera: &str, outcome: WindowOutcome) {
        let entry = self.cameras.entry(camera.to_owned()).or_default();
        entry.windows += 1;
        entry.frames_emitted += outcome.emitted as u64;
        entry.frames_dropped += outcome.dropped as u64;
        entry.frames_carried += outcome.carried as u64;
        entry.final_drift = outcome.drift;
    }

    pub fn record_no_data(&mut self, camera: &str) {
        self.cameras.entry(camera.to_owned()).or_default().windows_no_data += 1;
    }

    pub fn merge(&mut self, other: RunSummary) {
        for (camera, summary) in other.cameras {
            let entry = self.cameras.entry(camera).or_default();
            entry.windows += summary.windows;
            entry.windows_no_data += summary.windows_no_data;
            entry.frames_emitted += summary.frames_emitted;
            entry.frames_dropped += summary.frames_dropped;
            entry.frames_carried += summary.frames_carried;
            entry.final_drift = summary.final_drift;
        }
    }

    pub fn cameras(&self) -> impl Iterator<Item = (&str, &CameraSummary)> {
        self.cameras.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn totals(&self) -> CameraSummary {
        let mut totals = CameraSummary::default();
        for summary in self.cameras.values() {
            totals.windows += summary.windows;
            totals.windows_no_data += summary.windows_no_data;
            totals.frames_emitted += summary.frames_emitted;
            totals.frames_dropped += summary.frames_dropped;
            totals.frames_carried += summary.frames_carried;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_total() {
        let mut summary = RunSummary::new();
        summary.record_window(
            "cam-a",
            WindowOutcome {
                emitted: 100,
                dropped: 1,
                carried: 0,
                drift: 0,
            },
        );
        summary.record_window(
            "cam-b",
            WindowOutcome {
                emitted: 95,
                dropped: 0,
                carried: 0,
                drift: -5,
            },
        );
        summary.record_no_data("cam-b");

        let totals = summary.totals();
        assert_eq!(totals.windows, 2);
        assert_eq!(totals.windows_no_data, 1);
        assert_eq!(totals.frames_emitted, 195);
        assert_eq!(totals.frames_dropped, 1);
    }

    #[test]
    fn test_merge_keeps_last_drift() {
        let mut a = RunSummary::new();
        a.record_window("cam-a", WindowOutcome { emitted: 100, drift: 2, ..Default::default() });

        let mut b = RunSummary::new();
        b.record_window("cam-a", WindowOutcome { emitted: 100, drift: -1, ..Default::default() });

        a.merge(b);
        let (_, summary) = a.cameras().next().unwrap();
        assert_eq!(summary.windows, 2);
        assert_eq!(summary.final_drift, -1);
    }
}

//! SegmentStore trait - persistence collaborator interface
//!
//! The remote store is an opaque key/filter get-put service. Only the
//! key shape and the three operations are part of the contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CameraId, PipelineError, ReconciledSegment};

/// Address of a persisted segment.
///
/// Cameras produce identical corrected timestamps for the same window,
/// so the camera is part of the key; without it, concurrent cameras
/// would clobber each other's segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
    /// Pipeline stage name (e.g. "pose_reconciliation_2d")
    pub stage: String,

    /// Environment the cameras belong to
    pub environment_id: String,

    /// Camera the segment belongs to
    pub camera_id: CameraId,

    /// Processing-run identifier; re-runs that reuse an id merge into
    /// the same keyspace
    pub run_id: String,

    /// Window start; `None` addresses run-level records
    pub window_start: Option<DateTime<Utc>>,
}

/// Filter for range queries over persisted keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFilter {
    pub stage: Option<String>,
    pub environment_id: Option<String>,
    pub camera_id: Option<CameraId>,
    pub run_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl StoreFilter {
    /// Whether `key` passes the filter.
    pub fn matches(&self, key: &StoreKey) -> bool {
        if let Some(stage) = &self.stage {
            if &key.stage != stage {
                return false;
            }
        }
        if let Some(environment_id) = &self.environment_id {
            if &key.environment_id != environment_id {
                return false;
            }
        }
        if let Some(camera_id) = &self.camera_id {
            if &key.camera_id != camera_id {
                return false;
            }
        }
        if let Some(run_id) = &self.run_id {
            if &key.run_id != run_id {
                return false;
            }
        }
        match (key.window_start, self.from, self.to) {
            (None, None, None) => true,
            (None, _, _) => false,
            (Some(start), from, to) => {
                from.is_none_or(|f| start >= f) && to.is_none_or(|t| start < t)
            }
        }
    }
}

/// Persistence collaborator trait
///
/// All store implementations must implement this trait.
#[trait_variant::make(SegmentStore: Send)]
pub trait LocalSegmentStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Fetch the segment persisted under `key`, if any
    async fn get(&self, key: &StoreKey) -> Result<Option<ReconciledSegment>, PipelineError>;

    /// Persist `segment` under `key`, replacing any previous value
    async fn put(&mut self, key: &StoreKey, segment: ReconciledSegment)
        -> Result<(), PipelineError>;

    /// List keys matching `filter`
    async fn query(&self, filter: &StoreFilter) -> Result<Vec<StoreKey>, PipelineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key(run_id: &str, hour: u32) -> StoreKey {
        StoreKey {
            stage: "pose_reconciliation_2d".into(),
            environment_id: "env1".into(),
            camera_id: CameraId::from("cam-a"),
            run_id: run_id.into(),
            window_start: Some(Utc.with_ymd_and_hms(2024, 3, 15, hour, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_filter_by_run_id() {
        let filter = StoreFilter {
            run_id: Some("run_a".into()),
            ..Default::default()
        };
        assert!(filter.matches(&key("run_a", 10)));
        assert!(!filter.matches(&key("run_b", 10)));
    }

    #[test]
    fn test_filter_by_camera() {
        let filter = StoreFilter {
            camera_id: Some(CameraId::from("cam-b")),
            ..Default::default()
        };
        assert!(!filter.matches(&key("r", 10)));

        let mut other = key("r", 10);
        other.camera_id = CameraId::from("cam-b");
        assert!(filter.matches(&other));
    }

    #[test]
    fn test_filter_time_range_half_open() {
        let filter = StoreFilter {
            from: Some(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(filter.matches(&key("r", 10)));
        assert!(filter.matches(&key("r", 11)));
        assert!(!filter.matches(&key("r", 12)));
        assert!(!filter.matches(&key("r", 9)));
    }
}

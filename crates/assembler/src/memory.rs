//! In-memory store, used for dry runs and tests.

use std::collections::HashMap;

use contracts::{PipelineError, ReconciledSegment, SegmentStore, StoreFilter, StoreKey};

#[derive(Debug, Default)]
pub struct MemoryStore {
    segments: HashMap<StoreKey, ReconciledSegment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl SegmentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &StoreKey) -> Result<Option<ReconciledSegment>, PipelineError> {
        Ok(self.segments.get(key).cloned())
    }

    async fn put(
        &mut self,
        key: &StoreKey,
        segment: ReconciledSegment,
    ) -> Result<(), PipelineError> {
        self.segments.insert(key.clone(), segment);
        Ok(())
    }

    async fn query(&self, filter: &StoreFilter) -> Result<Vec<StoreKey>, PipelineError> {
        let mut keys: Vec<StoreKey> = self
            .segments
            .keys()
            .filter(|k| filter.matches(k))
            .cloned()
            .collect();
        keys.sort_by(|a, b| {
            a.window_start
                .cmp(&b.window_start)
                .then_with(|| a.camera_id.as_ref().cmp(b.camera_id.as_ref()))
        });
        Ok(keys)
    }
}

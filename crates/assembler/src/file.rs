//! JSON-file store.
//!
//! Layout: `{base}/{stage}/{environment}/{run_id}/{camera}/{window start}.json`,
//! window starts formatted as `YYYYMMDDTHHMMSSZ`. Run-level records
//! (keys without a window) land in `run.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use contracts::{CameraId, PipelineError, ReconciledSegment, SegmentStore, StoreFilter, StoreKey};
use tracing::debug;

const WINDOW_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn path_for(&self, key: &StoreKey) -> PathBuf {
        let file_name = match key.window_start {
            Some(start) => format!("{}.json", start.format(WINDOW_FORMAT)),
            None => "run.json".to_owned(),
        };
        self.base_path
            .join(&key.stage)
            .join(&key.environment_id)
            .join(&key.run_id)
            .join(key.camera_id.as_ref())
            .join(file_name)
    }

    fn window_from_file_name(name: &str) -> Option<DateTime<Utc>> {
        let stem = name.strip_suffix(".json")?;
        NaiveDateTime::parse_from_str(stem, WINDOW_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    async fn dir_names(path: &Path) -> Result<Vec<String>, PipelineError> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_owned());
            }
        }
        Ok(names)
    }
}

impl SegmentStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &StoreKey) -> Result<Option<ReconciledSegment>, PipelineError> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PipelineError::store_read(self.name(), e.to_string()));
            }
        };

        let segment = serde_json::from_str(&content).map_err(|e| {
            PipelineError::store_read(
                self.name(),
                format!("corrupt segment at '{}': {e}", path.display()),
            )
        })?;
        Ok(Some(segment))
    }

    async fn put(
        &mut self,
        key: &StoreKey,
        segment: ReconciledSegment,
    ) -> Result<(), PipelineError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::store_write(self.name(), e.to_string()))?;
        }

        let content = serde_json::to_vec_pretty(&segment)
            .map_err(|e| PipelineError::store_write(self.name(), e.to_string()))?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| PipelineError::store_write(self.name(), e.to_string()))?;

        debug!(path = %path.display(), frames = segment.frames.len(), "segment written");
        Ok(())
    }

    async fn query(&self, filter: &StoreFilter) -> Result<Vec<StoreKey>, PipelineError> {
        let mut keys = Vec::new();

        for stage in Self::dir_names(&self.base_path).await? {
            let stage_dir = self.base_path.join(&stage);
            for environment_id in Self::dir_names(&stage_dir).await? {
                let env_dir = stage_dir.join(&environment_id);
                for run_id in Self::dir_names(&env_dir).await? {
                    let run_dir = env_dir.join(&run_id);
                    for camera in Self::dir_names(&run_dir).await? {
                        let camera_dir = run_dir.join(&camera);
                        for file_name in Self::dir_names(&camera_dir).await? {
                            let window_start = if file_name == "run.json" {
                                None
                            } else {
                                match Self::window_from_file_name(&file_name) {
                                    Some(start) => Some(start),
                                    None => continue,
                                }
                            };
                            let key = StoreKey {
                                stage: stage.clone(),
                                environment_id: environment_id.clone(),
                                camera_id: CameraId::from(camera.as_str()),
                                run_id: run_id.clone(),
                                window_start,
                            };
                            if filter.matches(&key) {
                                keys.push(key);
                            }
                        }
                    }
                }
            }
        }

        keys.sort_by(|a, b| {
            a.window_start
                .cmp(&b.window_start)
                .then_with(|| a.camera_id.as_ref().cmp(b.camera_id.as_ref()))
        });
        Ok(keys)
    }
}

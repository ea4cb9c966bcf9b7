//! # Frame Locator
//!
//! Filesystem discovery for pose output files.
//!
//! Responsibilities:
//! - Generate the ordered window sequence for a processing range
//! - Map (camera, window) to the on-disk directory for either layout
//! - Enumerate candidate frame files and extract their frame indices
//! - Discover camera directories when the config lists none
//!
//! Discovery goes through the [`Vfs`] trait so the enumeration logic can
//! be exercised against an in-memory tree.

mod naming;
mod vfs;
pub mod window;

pub use naming::{glob_pattern, parse_relative, GlobSpec, ParsedPath};
pub use vfs::{MemVfs, OsVfs, Vfs};

use std::path::PathBuf;

use contracts::{CameraId, LayoutVariant, PipelineError, TimeWindow};
use tracing::debug;

/// A single file found for a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    pub path: PathBuf,
    /// Frame index parsed from the file name. `None` for the
    /// file-per-segment layout, where one file covers the whole window.
    pub frame_index: Option<u32>,
}

/// Everything found on disk for one (camera, window) pair.
#[derive(Debug, Clone)]
pub struct WindowListing {
    pub window: TimeWindow,
    /// Sorted by frame index for file-per-frame; single entry otherwise.
    pub files: Vec<LocatedFile>,
}

/// Locates pose output files underneath a base directory.
#[derive(Debug, Clone)]
pub struct FrameLocator<V = OsVfs> {
    base_dir: PathBuf,
    layout: LayoutVariant,
    environment_id: String,
    vfs: V,
}

impl FrameLocator<OsVfs> {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        layout: LayoutVariant,
        environment_id: impl Into<String>,
    ) -> Self {
        Self::with_vfs(base_dir, layout, environment_id, OsVfs)
    }
}

impl<V: Vfs> FrameLocator<V> {
    pub fn with_vfs(
        base_dir: impl Into<PathBuf>,
        layout: LayoutVariant,
        environment_id: impl Into<String>,
        vfs: V,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            layout,
            environment_id: environment_id.into(),
            vfs,
        }
    }

    /// Directory holding the files for one (camera, window) pair.
    pub fn window_dir(&self, camera: &CameraId, window: &TimeWindow) -> PathBuf {
        naming::window_dir(
            &self.base_dir,
            self.layout,
            &self.environment_id,
            camera,
            window.start,
        )
    }

    /// Enumerate files for a window.
    ///
    /// Returns `Ok(None)` when the window directory (or the segment file)
    /// does not exist; the caller decides how an absent window is treated.
    /// File names that do not match the expected pattern are skipped.
    pub fn discover(
        &self,
        camera: &CameraId,
        window: &TimeWindow,
    ) -> Result<Option<WindowListing>, PipelineError> {
        let dir = self.window_dir(camera, window);

        match self.layout {
            LayoutVariant::FilePerSegment => {
                // `segment_file_name` is Some for this variant by construction.
                let file_name = self
                    .layout
                    .segment_file_name()
                    .ok_or_else(|| PipelineError::other("layout has no segment file name"))?;
                let path = dir.join(file_name);
                if !self.vfs.exists(&path) {
                    return Ok(None);
                }
                Ok(Some(WindowListing {
                    window: *window,
                    files: vec![LocatedFile {
                        path,
                        frame_index: None,
                    }],
                }))
            }
            LayoutVariant::FilePerFrame => {
                let names = match self.vfs.read_dir(&dir) {
                    Ok(names) => names,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let mut files = Vec::new();
                for name in names {
                    match naming::parse_frame_file_name(&name) {
                        Some(index) => files.push(LocatedFile {
                            path: dir.join(&name),
                            frame_index: Some(index),
                        }),
                        None => {
                            debug!(file = %name, dir = %dir.display(), "skipping unrecognized file");
                        }
                    }
                }

                if files.is_empty() {
                    return Ok(None);
                }

                files.sort_by_key(|f| f.frame_index);
                Ok(Some(WindowListing {
                    window: *window,
                    files,
                }))
            }
        }
    }

    /// Discover camera ids by listing the environment directory.
    ///
    /// Used when the configuration does not pin a camera list.
    pub fn discover_cameras(&self) -> Result<Vec<CameraId>, PipelineError> {
        let env_dir = self
            .base_dir
            .join(self.layout.subdirectory())
            .join(&self.environment_id);

        let names = match self.vfs.read_dir(&env_dir) {
            Ok(names) => names,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut cameras: Vec<CameraId> = names.into_iter().map(CameraId::from).collect();
        cameras.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        Ok(cameras)
    }

    /// Read the content of a located file.
    pub fn read(&self, file: &LocatedFile) -> Result<String, PipelineError> {
        Ok(self.vfs.read_to_string(&file.path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn window_at(h: u32, m: u32, s: u32) -> TimeWindow {
        TimeWindow {
            start: Utc.with_ymd_and_hms(2024, 3, 15, h, m, s).unwrap(),
            width: TimeDelta::seconds(10),
        }
    }

    fn mem_locator(layout: LayoutVariant, vfs: MemVfs) -> FrameLocator<MemVfs> {
        FrameLocator::with_vfs("/data", layout, "greenbrier", vfs)
    }

    #[test]
    fn test_discover_segment_file() {
        let mut vfs = MemVfs::new();
        vfs.insert(
            "/data/prepared/greenbrier/cam-a/2024/03/15/10-00-00/alphapose-results.json",
            "[]",
        );
        let locator = mem_locator(LayoutVariant::FilePerSegment, vfs);

        let listing = locator
            .discover(&CameraId::from("cam-a"), &window_at(10, 0, 0))
            .unwrap()
            .expect("listing");
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].frame_index, None);
    }

    #[test]
    fn test_discover_missing_window_is_none() {
        let locator = mem_locator(LayoutVariant::FilePerSegment, MemVfs::new());
        let result = locator
            .discover(&CameraId::from("cam-a"), &window_at(10, 0, 0))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_discover_frame_files_sorted_and_filtered() {
        let mut vfs = MemVfs::new();
        let dir = "/data/poses_2d/greenbrier/cam-a/2024/03/15/10-00-10";
        vfs.insert(format!("{dir}/poses-2.json"), "{}");
        vfs.insert(format!("{dir}/poses-0.json"), "{}");
        vfs.insert(format!("{dir}/poses-1.json"), "{}");
        vfs.insert(format!("{dir}/notes.txt"), "ignored");
        let locator = mem_locator(LayoutVariant::FilePerFrame, vfs);

        let listing = locator
            .discover(&CameraId::from("cam-a"), &window_at(10, 0, 10))
            .unwrap()
            .expect("listing");
        let indices: Vec<_> = listing.files.iter().map(|f| f.frame_index).collect();
        assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_discover_cameras_sorted() {
        let mut vfs = MemVfs::new();
        vfs.insert(
            "/data/prepared/greenbrier/cam-b/2024/03/15/10-00-00/alphapose-results.json",
            "[]",
        );
        vfs.insert(
            "/data/prepared/greenbrier/cam-a/2024/03/15/10-00-00/alphapose-results.json",
            "[]",
        );
        let locator = mem_locator(LayoutVariant::FilePerSegment, vfs);

        let cameras = locator.discover_cameras().unwrap();
        assert_eq!(cameras, vec![CameraId::from("cam-a"), CameraId::from("cam-b")]);
    }

    #[test]
    fn test_discover_cameras_missing_env_dir_is_empty() {
        let locator = mem_locator(LayoutVariant::FilePerSegment, MemVfs::new());
        assert!(locator.discover_cameras().unwrap().is_empty());
    }
}

//! Path naming scheme for pose output files.
//!
//! Files live at
//! `{base}/{layout subdir}/{environment}/{camera}/{YYYY}/{MM}/{DD}/{HH-MM-SS}/{file}`
//! where `HH-MM-SS` is the window start. All numeric components are
//! zero-padded.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use contracts::LayoutVariant;

/// Directory for one (camera, window) pair.
pub fn window_dir(
    base: &Path,
    layout: LayoutVariant,
    environment_id: &str,
    camera: &str,
    start: DateTime<Utc>,
) -> PathBuf {
    base.join(layout.subdirectory())
        .join(environment_id)
        .join(camera)
        .join(format!("{:04}", start.year()))
        .join(format!("{:02}", start.month()))
        .join(format!("{:02}", start.day()))
        .join(format!(
            "{:02}-{:02}-{:02}",
            start.hour(),
            start.minute(),
            start.second()
        ))
}

/// Frame index from a `poses-{i}.json` file name.
pub fn parse_frame_file_name(name: &str) -> Option<u32> {
    let stem = name.strip_prefix("poses-")?.strip_suffix(".json")?;
    stem.parse().ok()
}

/// Path components recovered from a file path relative to the layout
/// subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub environment_id: String,
    pub camera_id: String,
    pub window_start: DateTime<Utc>,
    pub frame_index: Option<u32>,
}

/// Inverse of the naming scheme.
///
/// `relative` must be `{env}/{camera}/{YYYY}/{MM}/{DD}/{HH-MM-SS}/{file}`.
/// Returns `None` for paths that do not follow the scheme.
pub fn parse_relative(relative: &Path) -> Option<ParsedPath> {
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    let [env, camera, year, month, day, time, file] = parts.as_slice() else {
        return None;
    };

    let (hour, minute, second) = parse_time_dir(time)?;
    let window_start = Utc
        .with_ymd_and_hms(
            year.parse().ok()?,
            month.parse().ok()?,
            day.parse().ok()?,
            hour,
            minute,
            second,
        )
        .single()?;

    let frame_index = parse_frame_file_name(file);

    Some(ParsedPath {
        environment_id: (*env).to_owned(),
        camera_id: (*camera).to_owned(),
        window_start,
        frame_index,
    })
}

fn parse_time_dir(name: &str) -> Option<(u32, u32, u32)> {
    let mut it = name.split('-');
    let hour = parse_two_digits(it.next()?)?;
    let minute = parse_two_digits(it.next()?)?;
    let second = parse_two_digits(it.next()?)?;
    if it.next().is_some() {
        return None;
    }
    Some((hour, minute, second))
}

fn parse_two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 {
        return None;
    }
    s.parse().ok()
}

/// Wildcard-able path components for a shell-style glob.
///
/// `None` fields become wildcards of the matching width.
#[derive(Debug, Clone, Default)]
pub struct GlobSpec<'a> {
    pub environment_id: Option<&'a str>,
    pub camera_id: Option<&'a str>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    pub file_name: Option<&'a str>,
}

/// Build a glob pattern over the naming scheme.
pub fn glob_pattern(base: &Path, layout: LayoutVariant, spec: &GlobSpec<'_>) -> String {
    fn pad2(v: Option<u32>) -> String {
        v.map_or_else(|| "??".to_owned(), |v| format!("{v:02}"))
    }

    let year = spec
        .year
        .map_or_else(|| "????".to_owned(), |y| format!("{y:04}"));
    let time = format!(
        "{}-{}-{}",
        pad2(spec.hour),
        pad2(spec.minute),
        pad2(spec.second)
    );

    let mut path = base.join(layout.subdirectory());
    path.push(spec.environment_id.unwrap_or("*"));
    path.push(spec.camera_id.unwrap_or("*"));
    path.push(year);
    path.push(pad2(spec.month));
    path.push(pad2(spec.day));
    path.push(time);
    path.push(spec.file_name.unwrap_or("*"));
    path.to_string_lossy().into_owned()
}

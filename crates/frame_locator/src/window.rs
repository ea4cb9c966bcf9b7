//! Window sequence generation for a processing range.

use chrono::{DateTime, TimeDelta, Utc};
use contracts::{align_down, TimeWindow};

/// Generate the ordered window sequence covering `[start, end)`.
///
/// The first window is `start` aligned down to a `width` boundary, so it
/// may begin before `start`. A degenerate range whose aligned start equals
/// `end` still yields exactly one window, so a point query always has a
/// window to land in.
pub fn generate(start: DateTime<Utc>, end: DateTime<Utc>, width: TimeDelta) -> Vec<TimeWindow> {
    let aligned = align_down(start, width);
    let mut windows = Vec::new();
    let mut cursor = aligned;
    while cursor < end {
        windows.push(TimeWindow {
            start: cursor,
            width,
        });
        cursor += width;
    }
    if windows.is_empty() {
        windows.push(TimeWindow {
            start: aligned,
            width,
        });
    }
    windows
}

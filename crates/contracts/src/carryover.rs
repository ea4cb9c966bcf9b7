//! CarryoverState - the value threaded through a camera's reconciliation fold.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{CameraId, Frame};

/// Drift bookkeeping carried from one window to the next.
///
/// Owned exclusively by one camera's fold; created empty at the start of
/// the processed range, threaded window-by-window in strictly increasing
/// time order, and discarded when the range is exhausted. Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarryoverState {
    /// Camera this state belongs to
    pub camera_id: CameraId,

    /// Signed drift: positive = surplus frames pending in `pending`,
    /// negative = deficit (recorded for diagnostics, never backfilled)
    pub drift_count: i64,

    /// Surplus frames whose corrected position belongs to the next
    /// window, renumbered to window-local indices starting at 0
    pub pending: VecDeque<Frame>,
}

impl CarryoverState {
    /// Empty state for the start of a camera's processed range.
    pub fn empty(camera_id: CameraId) -> Self {
        Self {
            camera_id,
            drift_count: 0,
            pending: VecDeque::new(),
        }
    }

    /// True when there is neither surplus nor recorded deficit.
    pub fn is_neutral(&self) -> bool {
        self.drift_count == 0 && self.pending.is_empty()
    }
}

//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All instants are UTC (`chrono::DateTime<Utc>`)
//! - A camera's raw clock drifts; corrected timestamps are assigned by the
//!   reconciler from window start + frame index × frame period

mod blueprint;
mod camera_id;
mod carryover;
pub mod constants;
mod error;
mod frame;
mod layout;
mod segment;
mod store;
mod window;

pub use blueprint::*;
pub use camera_id::CameraId;
pub use carryover::CarryoverState;
pub use error::*;
pub use frame::*;
pub use layout::LayoutVariant;
pub use segment::ReconciledSegment;
pub use store::*;
pub use window::{align_down, TimeWindow};

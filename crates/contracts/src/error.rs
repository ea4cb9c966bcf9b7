//! Layered error definitions
//!
//! Categorized by source: config / locate / parse / reconcile / store

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::CameraId;

/// Unified error type
#[derive(Debug, Error)]
pub enum PipelineError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Parse Errors =====
    /// Malformed payload; fatal for the window it belongs to
    #[error("payload parse error in '{path}': {message}")]
    Parse { path: String, message: String },

    /// Payload-embedded value contradicts the path-derived one.
    /// Never auto-corrected - it signals corrupted or mislabeled input.
    #[error("data integrity error: {field} mismatch (expected '{expected}', found '{actual}')")]
    DataIntegrity {
        field: String,
        expected: String,
        actual: String,
    },

    // ===== Reconciliation Errors =====
    /// Observed frame indices in a raw window are not the contiguous
    /// range 0..N_obs-1; a mid-window gap cannot be safely patched
    #[error("sequencing error for camera '{camera_id}' in window starting {window_start}: {detail}")]
    Sequencing {
        camera_id: CameraId,
        window_start: DateTime<Utc>,
        detail: String,
    },

    // ===== Store Errors =====
    /// Store read error
    #[error("store '{store}' read error: {message}")]
    StoreRead { store: String, message: String },

    /// Store write error
    #[error("store '{store}' write error: {message}")]
    StoreWrite { store: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create payload parse error
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create data integrity error
    pub fn data_integrity(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::DataIntegrity {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create sequencing error
    pub fn sequencing(
        camera_id: CameraId,
        window_start: DateTime<Utc>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Sequencing {
            camera_id,
            window_start,
            detail: detail.into(),
        }
    }

    /// Create store write error
    pub fn store_write(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create store read error
    pub fn store_read(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreRead {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create other error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

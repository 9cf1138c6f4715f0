//! # Structured Error Handling
//!
//! Crate-level error type aggregating the component errors so embedders can
//! hold a single error surface. Component modules define their own thiserror
//! enums and fold in here via `#[from]`.

use thiserror::Error;

use crate::events::channel::PublishError;
use crate::recovery::RecoveryError;
use crate::snapshot::SnapshotError;
use crate::tracker::TrackerError;

/// Top-level error for package lifecycle operations.
#[derive(Debug, Error)]
pub enum PackrefError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, PackrefError>;

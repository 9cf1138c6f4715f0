//! # Lifecycle Recovery
//!
//! Rebuilds the tracker's in-memory reference state from the snapshot store
//! at process start. The maps themselves are never persisted; after a
//! control-plane restart every non-terminal job and actor is replayed as an
//! increment before any live traffic is accepted.
//!
//! Recovery is a cold-start reconstruction, not an incremental merge:
//! running it twice would double-count every entry, so a second call is
//! rejected outright.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::snapshot::{SnapshotError, SnapshotStore};
use crate::tracker::{PackageReferenceTracker, TrackerError};

/// Errors surfaced while reconstructing reference state.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The snapshot could not be enumerated. Fatal to startup: the control
    /// plane must not serve traffic with an unknown reference baseline.
    #[error("Snapshot enumeration failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Reference replay failed: {0}")]
    Replay(#[from] TrackerError),

    #[error("Lifecycle recovery already ran for this process")]
    AlreadyRecovered,
}

/// Summary of a completed recovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub jobs_replayed: usize,
    pub actors_replayed: usize,
    pub skipped_dead: usize,
}

/// One-shot reconstruction of tracker state from the snapshot store.
pub struct LifecycleRecovery {
    tracker: Arc<PackageReferenceTracker>,
    recovered: AtomicBool,
}

impl LifecycleRecovery {
    pub fn new(tracker: Arc<PackageReferenceTracker>) -> Self {
        Self {
            tracker,
            recovered: AtomicBool::new(false),
        }
    }

    /// Replay every live job and actor out of `store`.
    ///
    /// Must complete before the tracker sees any live increment/decrement
    /// traffic. Terminal records are skipped; enumeration failure aborts
    /// startup with nothing partially applied becoming live.
    pub async fn recover(
        &self,
        store: &dyn SnapshotStore,
    ) -> Result<RecoveryReport, RecoveryError> {
        if self.recovered.swap(true, Ordering::SeqCst) {
            warn!("Rejected repeated lifecycle recovery attempt");
            return Err(RecoveryError::AlreadyRecovered);
        }

        let jobs = store.all_jobs().await?;
        let actors = store.all_actors().await?;

        let mut report = RecoveryReport::default();

        for job in &jobs {
            if job.is_dead {
                report.skipped_dead += 1;
                continue;
            }
            self.tracker
                .increment(&job.job_id, job.runtime_env.package_identity())?;
            report.jobs_replayed += 1;
        }

        for actor in &actors {
            if actor.state.is_terminal() {
                report.skipped_dead += 1;
                continue;
            }
            self.tracker
                .increment(&actor.actor_id, actor.runtime_env.package_identity())?;
            report.actors_replayed += 1;
        }

        info!(
            jobs_replayed = report.jobs_replayed,
            actors_replayed = report.actors_replayed,
            skipped_dead = report.skipped_dead,
            "🔄 Reference state recovered from snapshot"
        );
        Ok(report)
    }
}

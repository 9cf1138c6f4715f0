//! # Snapshot Store Contract
//!
//! The durable table service holding job/actor records is an external
//! collaborator. This module defines the enumeration contract lifecycle
//! recovery needs from it, plus an in-memory implementation used by tests and
//! lightweight embedders.
//!
//! ## Overview
//!
//! At process start the control plane replays every non-terminal job and
//! actor out of the snapshot to rebuild in-memory reference counts. A store
//! that cannot enumerate is fatal to startup: serving live traffic with an
//! unknown reference baseline risks both storage leaks and premature
//! deletion.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{ActorRecord, JobRecord};

/// Errors surfaced by a snapshot store backend.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Snapshot record corrupt: {message}")]
    Corrupt { message: String },
}

impl SnapshotError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Enumeration contract over the durable job/actor tables.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Every persisted job record, terminal or not.
    async fn all_jobs(&self) -> SnapshotResult<Vec<JobRecord>>;

    /// Every persisted actor record, terminal or not.
    async fn all_actors(&self) -> SnapshotResult<Vec<ActorRecord>>;
}

/// In-memory snapshot store.
///
/// Keyed by owner id; insertion replaces any existing record for that owner.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
    actors: Arc<RwLock<HashMap<String, ActorRecord>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_job(&self, job: JobRecord) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.job_id.clone(), job);
    }

    pub async fn insert_actor(&self, actor: ActorRecord) {
        let mut actors = self.actors.write().await;
        actors.insert(actor.actor_id.clone(), actor);
    }

    pub async fn get_job(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn all_jobs(&self) -> SnapshotResult<Vec<JobRecord>> {
        Ok(self.jobs.read().await.values().cloned().collect())
    }

    async fn all_actors(&self) -> SnapshotResult<Vec<ActorRecord>> {
        Ok(self.actors.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActorState, RuntimeEnv};

    #[tokio::test]
    async fn test_insert_replaces_by_owner_id() {
        let store = InMemorySnapshotStore::new();
        store
            .insert_job(JobRecord::new("job-1", RuntimeEnv::new("s3://a")))
            .await;
        store
            .insert_job(JobRecord::new("job-1", RuntimeEnv::new("s3://b")).finished())
            .await;

        let jobs = store.all_jobs().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].is_dead);

        let job = store.get_job("job-1").await.unwrap();
        assert_eq!(job.runtime_env.package_identity(), Some("s3://b"));
    }

    #[tokio::test]
    async fn test_enumerates_jobs_and_actors() {
        let store = InMemorySnapshotStore::new();
        store
            .insert_job(JobRecord::new("job-1", RuntimeEnv::default()))
            .await;
        store
            .insert_actor(ActorRecord::new(
                "actor-1",
                ActorState::Alive,
                RuntimeEnv::default(),
            ))
            .await;

        assert_eq!(store.all_jobs().await.unwrap().len(), 1);
        assert_eq!(store.all_actors().await.unwrap().len(), 1);
    }
}

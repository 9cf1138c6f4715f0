//! # Package Lifecycle Facade
//!
//! Wires the tracker, notifier, and GC publisher together the way the
//! surrounding control plane consumes them: one increment per admission, one
//! job-finished notification per durable terminal transition, recovery before
//! any live traffic. Persistence of the records themselves stays with the
//! embedder; this facade only drives reference accounting.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::PackrefConfig;
use crate::error::Result;
use crate::events::channel::{BroadcastEventChannel, GcEvent};
use crate::events::gc_publisher::{GcPublisher, RetryPolicy};
use crate::events::notifier::{
    JobCompletionNotifier, JobFinishedListener, ListenerError, NotifyOutcome,
};
use crate::models::{ActorRecord, JobRecord};
use crate::recovery::{LifecycleRecovery, RecoveryReport};
use crate::snapshot::SnapshotStore;
use crate::tracker::PackageReferenceTracker;

/// Listener wiring the tracker's decrement path into job-completion fan-out.
struct TrackerDecrementListener {
    tracker: Arc<PackageReferenceTracker>,
}

#[async_trait]
impl JobFinishedListener for TrackerDecrementListener {
    async fn on_job_finished(&self, job_id: &str) -> std::result::Result<(), ListenerError> {
        self.tracker
            .decrement(job_id)
            .map(|_| ())
            .map_err(|e| ListenerError::new(e.to_string()))
    }

    fn listener_name(&self) -> &str {
        "package_reference_tracker"
    }
}

/// Control-plane facade over package reference accounting.
pub struct PackageLifecycle {
    tracker: Arc<PackageReferenceTracker>,
    notifier: Arc<JobCompletionNotifier>,
    recovery: LifecycleRecovery,
    channel: Arc<BroadcastEventChannel>,
}

impl PackageLifecycle {
    /// Build the component graph and register the tracker's decrement path
    /// as the first job-finished listener.
    pub async fn new(config: PackrefConfig) -> Self {
        let channel = Arc::new(BroadcastEventChannel::new(config.gc_channel_capacity));
        let policy = RetryPolicy {
            first: std::time::Duration::from_millis(config.publish_backoff_base_ms),
            max: std::time::Duration::from_millis(config.publish_backoff_max_ms),
            factor: crate::constants::PUBLISH_BACKOFF_FACTOR,
            max_attempts: config.publish_retry_limit,
        };
        let publisher = GcPublisher::new(channel.clone(), config.gc_channel_topic.clone(), policy);
        let tracker = Arc::new(PackageReferenceTracker::new(publisher));
        let notifier = Arc::new(JobCompletionNotifier::new());

        notifier
            .add_listener(Arc::new(TrackerDecrementListener {
                tracker: tracker.clone(),
            }))
            .await;

        info!(
            topic = %config.gc_channel_topic,
            "🚀 Package lifecycle initialized"
        );

        Self {
            tracker: tracker.clone(),
            notifier,
            recovery: LifecycleRecovery::new(tracker),
            channel,
        }
    }

    /// Rebuild reference state from the snapshot store.
    ///
    /// Must complete before any admission or completion traffic.
    pub async fn recover(&self, store: &dyn SnapshotStore) -> Result<RecoveryReport> {
        Ok(self.recovery.recover(store).await?)
    }

    /// Admit a job: exactly one reference increment for its package, if any.
    pub fn admit_job(&self, job: &JobRecord) -> Result<()> {
        if job.is_dead {
            warn!(job_id = %job.job_id, "Refusing to admit job already in terminal state");
            return Ok(());
        }
        self.tracker
            .increment(&job.job_id, job.runtime_env.package_identity())?;
        Ok(())
    }

    /// Admit an actor: exactly one reference increment for its package, if any.
    pub fn admit_actor(&self, actor: &ActorRecord) -> Result<()> {
        if actor.state.is_terminal() {
            warn!(actor_id = %actor.actor_id, "Refusing to admit actor already in terminal state");
            return Ok(());
        }
        self.tracker
            .increment(&actor.actor_id, actor.runtime_env.package_identity())?;
        Ok(())
    }

    /// Fan out a job's completion to every registered listener.
    ///
    /// The caller must have durably recorded the terminal state first.
    pub async fn mark_job_finished(&self, job_id: &str) -> NotifyOutcome {
        self.notifier.notify_job_finished(job_id).await
    }

    /// Release an actor's references directly; actors have no fan-out hook.
    pub fn mark_actor_dead(&self, actor_id: &str) -> Result<Vec<String>> {
        Ok(self.tracker.decrement(actor_id)?)
    }

    pub fn tracker(&self) -> &Arc<PackageReferenceTracker> {
        &self.tracker
    }

    pub fn notifier(&self) -> &Arc<JobCompletionNotifier> {
        &self.notifier
    }

    /// Receiver for deletion-eligibility events on the GC topic.
    pub fn gc_events(&self) -> broadcast::Receiver<GcEvent> {
        self.channel.subscribe()
    }
}

//! # Job Completion Notifier
//!
//! Registry of subsystems interested in job completion. Listeners are
//! appended once and invoked in registration order every time a job's
//! terminal state has been durably recorded; there is no removal and no
//! deduplication. Each invocation is isolated: a failing listener is logged
//! and the remaining listeners still run, so one misbehaving subsystem cannot
//! block cleanup in the others.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Error a listener may surface from its job-finished hook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ListenerError {
    pub message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trait for subsystems reacting to job completion.
#[async_trait]
pub trait JobFinishedListener: Send + Sync {
    /// Handle a finished job. The job's terminal state is already durable.
    async fn on_job_finished(&self, job_id: &str) -> Result<(), ListenerError>;

    /// Listener name for log attribution.
    fn listener_name(&self) -> &str {
        "unnamed_listener"
    }
}

/// Per-call delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered fan-out registry for job completion.
pub struct JobCompletionNotifier {
    listeners: RwLock<Vec<Arc<dyn JobFinishedListener>>>,
}

impl JobCompletionNotifier {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Append a listener to the registry.
    pub async fn add_listener(&self, listener: Arc<dyn JobFinishedListener>) {
        let mut listeners = self.listeners.write().await;
        info!(
            listener = listener.listener_name(),
            position = listeners.len(),
            "Registered job-finished listener"
        );
        listeners.push(listener);
    }

    /// Invoke every registered listener, in registration order.
    ///
    /// A listener failure is captured and logged; subsequent listeners still
    /// run.
    pub async fn notify_job_finished(&self, job_id: &str) -> NotifyOutcome {
        let listeners = {
            let guard = self.listeners.read().await;
            guard.clone()
        };

        if listeners.is_empty() {
            debug!(job_id = %job_id, "No listeners registered for job completion");
            return NotifyOutcome::default();
        }

        let mut outcome = NotifyOutcome::default();
        for listener in listeners {
            match listener.on_job_finished(job_id).await {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    outcome.failed += 1;
                    error!(
                        listener = listener.listener_name(),
                        job_id = %job_id,
                        error = %e,
                        "Job-finished listener failed"
                    );
                }
            }
        }

        debug!(
            job_id = %job_id,
            delivered = outcome.delivered,
            failed = outcome.failed,
            "Job completion fan-out finished"
        );
        outcome
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }
}

impl Default for JobCompletionNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Listener that records invocation order and can be told to fail.
    struct RecordingListener {
        name: String,
        fail: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingListener {
        fn new(name: &str, fail: bool, calls: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                fail,
                calls,
            })
        }
    }

    #[async_trait]
    impl JobFinishedListener for RecordingListener {
        async fn on_job_finished(&self, job_id: &str) -> Result<(), ListenerError> {
            self.calls.lock().push(format!("{}:{}", self.name, job_id));
            if self.fail {
                Err(ListenerError::new("listener exploded"))
            } else {
                Ok(())
            }
        }

        fn listener_name(&self) -> &str {
            &self.name
        }
    }

    #[tokio::test]
    async fn test_listeners_run_in_registration_order() {
        let notifier = JobCompletionNotifier::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        notifier
            .add_listener(RecordingListener::new("first", false, calls.clone()))
            .await;
        notifier
            .add_listener(RecordingListener::new("second", false, calls.clone()))
            .await;

        let outcome = notifier.notify_job_finished("job-1").await;
        assert_eq!(outcome, NotifyOutcome { delivered: 2, failed: 0 });
        assert_eq!(*calls.lock(), vec!["first:job-1", "second:job-1"]);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_block_the_rest() {
        let notifier = JobCompletionNotifier::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        notifier
            .add_listener(RecordingListener::new("bad", true, calls.clone()))
            .await;
        notifier
            .add_listener(RecordingListener::new("good", false, calls.clone()))
            .await;

        let outcome = notifier.notify_job_finished("job-2").await;
        assert_eq!(outcome, NotifyOutcome { delivered: 1, failed: 1 });
        assert_eq!(*calls.lock(), vec!["bad:job-2", "good:job-2"]);
    }

    #[tokio::test]
    async fn test_notify_with_no_listeners_is_noop() {
        let notifier = JobCompletionNotifier::new();
        let outcome = notifier.notify_job_finished("job-3").await;
        assert_eq!(outcome, NotifyOutcome::default());
    }
}

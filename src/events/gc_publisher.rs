//! # GC Publisher
//!
//! Emits deletion-eligibility events when a package's reference count reaches
//! zero. Publishing is fire-and-forget from the tracker's perspective: a
//! transient transport failure is retried with bounded exponential backoff,
//! logged, and ultimately dropped rather than surfaced — a package whose
//! event is lost is reclaimed later by the out-of-band sweep, which is
//! strictly better than crashing the control plane over a signaling hiccup.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::events::channel::EventChannel;

/// Retry backoff policy for publish attempts.
///
/// The delay for attempt `n` is `first × factor^n`, clamped to `max`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Total number of publish attempts before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            first: Duration::from_millis(crate::constants::DEFAULT_PUBLISH_BACKOFF_BASE_MS),
            max: Duration::from_millis(crate::constants::DEFAULT_PUBLISH_BACKOFF_MAX_MS),
            factor: crate::constants::PUBLISH_BACKOFF_FACTOR,
            max_attempts: crate::constants::DEFAULT_PUBLISH_RETRY_LIMIT,
        }
    }
}

impl RetryPolicy {
    /// Computes the delay for the given attempt number (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let clamped_exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(clamped_exp);

        if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped_secs)
        }
    }
}

/// Publisher for package deletion-eligibility events.
#[derive(Clone)]
pub struct GcPublisher {
    channel: Arc<dyn EventChannel>,
    topic: String,
    policy: RetryPolicy,
}

impl GcPublisher {
    pub fn new(channel: Arc<dyn EventChannel>, topic: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            channel,
            topic: topic.into(),
            policy,
        }
    }

    /// Publish that no live owner references `package` any more.
    ///
    /// Retries with backoff on transport failure. Returns whether the event
    /// was delivered to the channel; exhausting retries is logged, never
    /// propagated.
    pub async fn publish_deletion_eligible(&self, package: &str) -> bool {
        for attempt in 0..self.policy.max_attempts {
            match self.channel.publish(&self.topic, package).await {
                Ok(()) => {
                    debug!(
                        topic = %self.topic,
                        package = %package,
                        "📤 Published deletion-eligible event"
                    );
                    return true;
                }
                Err(e) => {
                    warn!(
                        topic = %self.topic,
                        package = %package,
                        attempt = attempt + 1,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "Publish of deletion-eligible event failed"
                    );
                    if attempt + 1 < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.delay_for(attempt)).await;
                    }
                }
            }
        }

        error!(
            topic = %self.topic,
            package = %package,
            "❌ Dropping deletion-eligible event after exhausting publish retries"
        );
        false
    }

    /// Detached publish for the decrement path.
    ///
    /// The tracker must never await the transport while its maps are locked;
    /// this hands the whole retry loop to a spawned task.
    pub fn spawn_publish(&self, package: String) {
        let publisher = self.clone();
        tokio::spawn(async move {
            publisher.publish_deletion_eligible(&package).await;
        });
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl std::fmt::Debug for GcPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcPublisher")
            .field("topic", &self.topic)
            .field("policy", &self.policy)
            .finish()
    }
}

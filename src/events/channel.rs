//! # Event Channel
//!
//! Publish contract over the cluster's pub/sub transport. Delivery is
//! at-least-attempted with no ordering guarantee across subscribers; this
//! crate only ever publishes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// Event emitted on the package GC topic.
///
/// The key carries the package identity; there is deliberately no payload.
/// Subscribers must re-verify that no new reference exists before reclaiming
/// storage, since an identity can be referenced again after this fires.
#[derive(Debug, Clone)]
pub struct GcEvent {
    pub topic: String,
    pub key: String,
    pub published_at: DateTime<Utc>,
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event channel is closed")]
    ChannelClosed,
    #[error("Transport error: {message}")]
    Transport { message: String },
}

/// Publish primitive keyed by topic.
#[async_trait]
pub trait EventChannel: Send + Sync {
    async fn publish(&self, topic: &str, key: &str) -> Result<(), PublishError>;
}

/// In-process event channel backed by a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastEventChannel {
    sender: broadcast::Sender<GcEvent>,
}

impl BroadcastEventChannel {
    /// Create a new event channel with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<GcEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventChannel for BroadcastEventChannel {
    async fn publish(&self, topic: &str, key: &str) -> Result<(), PublishError> {
        let event = GcEvent {
            topic: topic.to_string(),
            key: key.to_string(),
            published_at: Utc::now(),
        };

        // For broadcast channels, send() returns an error if there are no
        // subscribers. We want to publish events even if no one is listening.
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }
}

impl Default for BroadcastEventChannel {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_GC_CHANNEL_CAPACITY)
    }
}

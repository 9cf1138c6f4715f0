use crate::constants;
use crate::error::{PackrefError, Result};

#[derive(Debug, Clone)]
pub struct PackrefConfig {
    /// Topic the GC publisher emits deletion-eligibility events on.
    pub gc_channel_topic: String,
    /// Capacity of the in-process broadcast channel backing the GC topic.
    pub gc_channel_capacity: usize,
    /// Number of publish attempts before a GC event is dropped.
    pub publish_retry_limit: u32,
    pub publish_backoff_base_ms: u64,
    pub publish_backoff_max_ms: u64,
}

impl Default for PackrefConfig {
    fn default() -> Self {
        Self {
            gc_channel_topic: constants::PACKAGE_GC_CHANNEL.to_string(),
            gc_channel_capacity: constants::DEFAULT_GC_CHANNEL_CAPACITY,
            publish_retry_limit: constants::DEFAULT_PUBLISH_RETRY_LIMIT,
            publish_backoff_base_ms: constants::DEFAULT_PUBLISH_BACKOFF_BASE_MS,
            publish_backoff_max_ms: constants::DEFAULT_PUBLISH_BACKOFF_MAX_MS,
        }
    }
}

impl PackrefConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(topic) = std::env::var("PACKREF_GC_CHANNEL_TOPIC") {
            config.gc_channel_topic = topic;
        }

        if let Ok(capacity) = std::env::var("PACKREF_GC_CHANNEL_CAPACITY") {
            config.gc_channel_capacity = capacity.parse().map_err(|e| {
                PackrefError::Configuration(format!("Invalid gc_channel_capacity: {e}"))
            })?;
        }

        if let Ok(retry_limit) = std::env::var("PACKREF_PUBLISH_RETRY_LIMIT") {
            config.publish_retry_limit = retry_limit.parse().map_err(|e| {
                PackrefError::Configuration(format!("Invalid publish_retry_limit: {e}"))
            })?;
        }

        if let Ok(base_ms) = std::env::var("PACKREF_PUBLISH_BACKOFF_BASE_MS") {
            config.publish_backoff_base_ms = base_ms.parse().map_err(|e| {
                PackrefError::Configuration(format!("Invalid publish_backoff_base_ms: {e}"))
            })?;
        }

        if let Ok(max_ms) = std::env::var("PACKREF_PUBLISH_BACKOFF_MAX_MS") {
            config.publish_backoff_max_ms = max_ms.parse().map_err(|e| {
                PackrefError::Configuration(format!("Invalid publish_backoff_max_ms: {e}"))
            })?;
        }

        Ok(config)
    }
}

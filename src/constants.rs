//! # System Constants
//!
//! Well-known topic names and default tuning values shared across the crate.

/// Topic on which deletion-eligibility events are published.
///
/// Message shape: key = package identity URI, payload empty. Subscribers must
/// re-verify that no new reference was created before destroying storage,
/// since a package identity can be referenced again after this event fires.
pub const PACKAGE_GC_CHANNEL: &str = "package_gc_channel";

/// Default capacity of the in-process broadcast channel backing the GC topic.
pub const DEFAULT_GC_CHANNEL_CAPACITY: usize = 1000;

/// Default number of publish attempts before a GC event is dropped.
pub const DEFAULT_PUBLISH_RETRY_LIMIT: u32 = 3;

/// Default initial backoff between publish retries, in milliseconds.
pub const DEFAULT_PUBLISH_BACKOFF_BASE_MS: u64 = 100;

/// Default backoff cap for publish retries, in milliseconds.
pub const DEFAULT_PUBLISH_BACKOFF_MAX_MS: u64 = 5000;

/// Multiplicative growth factor between publish retry delays.
pub const PUBLISH_BACKOFF_FACTOR: f64 = 2.0;

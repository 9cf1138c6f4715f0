//! # Event System
//!
//! The publish side of the control plane's signaling: a topic-keyed event
//! channel contract, the GC publisher that emits deletion-eligibility events
//! on it, and the job-completion notifier that fans job-finished signals out
//! to registered subsystems.

pub mod channel;
pub mod gc_publisher;
pub mod notifier;

// Re-export key types for convenience
pub use channel::{BroadcastEventChannel, EventChannel, GcEvent, PublishError};
pub use gc_publisher::{GcPublisher, RetryPolicy};
pub use notifier::{JobCompletionNotifier, JobFinishedListener, ListenerError, NotifyOutcome};

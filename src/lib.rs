#![allow(clippy::doc_markdown)] // Allow technical terms like GC, URIs in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Packref Core
//!
//! Reference-counted package lifecycle tracking for a distributed compute
//! control plane.
//!
//! ## Overview
//!
//! Jobs and actors on the cluster run out of shared, content-addressed code
//! bundles ("packages"). This crate tracks which live owners reference which
//! package and emits a deletion-eligibility signal the moment the last
//! reference drops, so storage can be reclaimed without ever deleting a
//! bundle still in use.
//!
//! The accounting invariants are the whole point: an undercount leaks
//! storage forever, an overcount or race deletes a package out from under a
//! running actor. Everything else — the durable snapshot tables, the pub/sub
//! transport, RPC marshalling — is an external collaborator behind a trait.
//!
//! ## Module Organization
//!
//! - [`tracker`] - Reference count bookkeeping, the sole owner of the maps
//! - [`recovery`] - Cold-start reconstruction from the snapshot store
//! - [`events`] - GC publishing and job-completion fan-out
//! - [`lifecycle`] - Facade wiring admission, completion, and recovery
//! - [`models`] - Job/actor/runtime-env record types
//! - [`snapshot`] - Snapshot store contract and in-memory implementation
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use packref_core::config::PackrefConfig;
//! use packref_core::lifecycle::PackageLifecycle;
//! use packref_core::models::{JobRecord, RuntimeEnv};
//! use packref_core::snapshot::InMemorySnapshotStore;
//!
//! # async fn example() -> packref_core::Result<()> {
//! let lifecycle = PackageLifecycle::new(PackrefConfig::from_env()?).await;
//!
//! // Rebuild reference counts before serving traffic.
//! let store = InMemorySnapshotStore::new();
//! lifecycle.recover(&store).await?;
//!
//! // Admission takes a reference; completion releases it and signals GC
//! // once nothing references the bundle.
//! lifecycle.admit_job(&JobRecord::new("job-1", RuntimeEnv::new("s3://bundle")))?;
//! lifecycle.mark_job_finished("job-1").await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod recovery;
pub mod snapshot;
pub mod tracker;

pub use config::PackrefConfig;
pub use error::{PackrefError, Result};
pub use events::{
    BroadcastEventChannel, EventChannel, GcEvent, GcPublisher, JobCompletionNotifier,
    JobFinishedListener, ListenerError, NotifyOutcome, PublishError, RetryPolicy,
};
pub use lifecycle::PackageLifecycle;
pub use models::{ActorRecord, ActorState, JobRecord, RuntimeEnv};
pub use recovery::{LifecycleRecovery, RecoveryError, RecoveryReport};
pub use snapshot::{InMemorySnapshotStore, SnapshotError, SnapshotStore};
pub use tracker::{PackageReferenceTracker, TrackerError, TrackerStats};

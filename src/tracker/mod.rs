//! # Reference Count Tracker
//!
//! Owns the mapping from package identity to live-reference count and from
//! owner to its referenced packages. The tracker is the sole mutator of this
//! state; the maps are never exposed.

pub mod reference_counter;

pub use reference_counter::{PackageReferenceTracker, TrackerError, TrackerStats};

//! # Package Reference Counter
//!
//! Two maps under one lock: count-by-package and packages-by-owner. The
//! two-map design gives O(references-of-owner) decrement without scanning
//! all packages, and lets many owners share one package identity without
//! duplicate accounting.
//!
//! ## Concurrency
//!
//! Every mutation runs under a single mutex and never awaits. Deletion
//! eligibility is published only after the guard is dropped, through a
//! detached task, so a slow or failing transport can never stall subsequent
//! increments and decrements.
//!
//! ## Failure semantics
//!
//! A count that would go negative is an invariant violation: it means a
//! double-decrement or missed increment somewhere in the control plane.
//! The tracker reports it and refuses all further writes rather than
//! silently clamping — an undercount leaks storage forever, an overcount
//! deletes a package still in use.

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error};

use crate::events::gc_publisher::GcPublisher;

/// Errors surfaced by tracker mutations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A reference count would have gone negative.
    #[error("Reference count invariant violated for package {package} while releasing owner {owner}")]
    InvariantViolation { package: String, owner: String },

    /// A prior invariant violation halted the tracker; writes are refused.
    #[error("Reference tracker is halted after an invariant violation")]
    Halted,
}

/// Read-only diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerStats {
    pub tracked_packages: usize,
    pub tracked_owners: usize,
    pub total_references: i64,
}

#[derive(Debug, Default)]
struct TrackerState {
    /// Package identity -> number of live owners referencing it.
    /// An entry exists iff its count is > 0.
    package_references: HashMap<String, i64>,
    /// Owner -> package identities it referenced at admission.
    owner_packages: HashMap<String, Vec<String>>,
    /// Set on the first invariant violation; all later writes are refused.
    halted: bool,
}

/// Reference-counted package lifecycle tracker.
pub struct PackageReferenceTracker {
    state: Mutex<TrackerState>,
    publisher: GcPublisher,
}

impl PackageReferenceTracker {
    pub fn new(publisher: GcPublisher) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            publisher,
        }
    }

    /// Record that `owner_id` references `package`.
    ///
    /// A `None` or empty package means the owner has no package dependency
    /// and is a no-op. Callers must invoke this at most once per
    /// (owner, package) pair; the tracker does not deduplicate.
    pub fn increment(&self, owner_id: &str, package: Option<&str>) -> Result<(), TrackerError> {
        let package = match package {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(()),
        };

        let mut state = self.state.lock();
        if state.halted {
            return Err(TrackerError::Halted);
        }

        let count = state
            .package_references
            .entry(package.to_string())
            .or_insert(0);
        *count += 1;
        let count = *count;

        state
            .owner_packages
            .entry(owner_id.to_string())
            .or_default()
            .push(package.to_string());

        debug!(
            owner_id = %owner_id,
            package = %package,
            references = count,
            "Package reference added"
        );
        Ok(())
    }

    /// Release every package reference held by `owner_id`.
    ///
    /// Each package whose count reaches zero is removed from the count map
    /// and a deletion-eligibility event is published for it; the returned
    /// vector lists those identities. An owner with no recorded references
    /// is a no-op. A count that would go negative raises
    /// [`TrackerError::InvariantViolation`]; the owner's index entry is
    /// still removed (a dangling partial reference is worse than
    /// under-counting once) and publishes for counts that did reach zero
    /// still fire.
    pub fn decrement(&self, owner_id: &str) -> Result<Vec<String>, TrackerError> {
        let (released, violation) = {
            let mut state = self.state.lock();
            if state.halted {
                return Err(TrackerError::Halted);
            }

            let packages = match state.owner_packages.remove(owner_id) {
                Some(packages) => packages,
                None => {
                    debug!(owner_id = %owner_id, "Decrement for untracked owner ignored");
                    return Ok(Vec::new());
                }
            };

            let mut released = Vec::new();
            let mut violation = None;
            for package in packages {
                let remaining = state
                    .package_references
                    .get_mut(&package)
                    .map(|count| {
                        *count -= 1;
                        *count
                    });
                match remaining {
                    Some(count) if count > 0 => {
                        debug!(
                            owner_id = %owner_id,
                            package = %package,
                            references = count,
                            "Package reference released"
                        );
                    }
                    Some(0) => {
                        state.package_references.remove(&package);
                        released.push(package);
                    }
                    _ => {
                        // Absent entry (or a value that was already <= 0,
                        // which must never be stored) means this decrement
                        // has no matching increment.
                        state.package_references.remove(&package);
                        error!(
                            owner_id = %owner_id,
                            package = %package,
                            "❌ Reference count would go negative; halting tracker"
                        );
                        state.halted = true;
                        violation.get_or_insert_with(|| TrackerError::InvariantViolation {
                            package: package.clone(),
                            owner: owner_id.to_string(),
                        });
                    }
                }
            }
            (released, violation)
        };

        // Publish after the guard drops; the transport is never awaited
        // while the maps are locked.
        for package in &released {
            debug!(package = %package, "Package has no live references, eligible for GC");
            self.publisher.spawn_publish(package.clone());
        }

        match violation {
            Some(v) => Err(v),
            None => Ok(released),
        }
    }

    /// Current reference count for `package`, 0 if untracked.
    pub fn count(&self, package: &str) -> i64 {
        self.state
            .lock()
            .package_references
            .get(package)
            .copied()
            .unwrap_or(0)
    }

    pub fn stats(&self) -> TrackerStats {
        let state = self.state.lock();
        TrackerStats {
            tracked_packages: state.package_references.len(),
            tracked_owners: state.owner_packages.len(),
            total_references: state.package_references.values().sum(),
        }
    }

    /// Whether a prior invariant violation has halted writes.
    pub fn is_halted(&self) -> bool {
        self.state.lock().halted
    }

    /// Test hook: plant an owner index entry without touching counts,
    /// simulating a missed increment elsewhere in the system.
    #[cfg(test)]
    fn force_owner_entry(&self, owner_id: &str, packages: Vec<String>) {
        self.state
            .lock()
            .owner_packages
            .insert(owner_id.to_string(), packages);
    }
}

impl std::fmt::Debug for PackageReferenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("PackageReferenceTracker")
            .field("tracked_packages", &stats.tracked_packages)
            .field("tracked_owners", &stats.tracked_owners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::channel::BroadcastEventChannel;
    use crate::events::gc_publisher::RetryPolicy;
    use std::sync::Arc;
    use std::time::Duration;

    fn tracker_with_channel() -> (PackageReferenceTracker, Arc<BroadcastEventChannel>) {
        let channel = Arc::new(BroadcastEventChannel::new(64));
        let publisher = GcPublisher::new(channel.clone(), "gc", RetryPolicy::default());
        (PackageReferenceTracker::new(publisher), channel)
    }

    #[tokio::test]
    async fn test_increment_and_count() {
        let (tracker, _channel) = tracker_with_channel();

        tracker.increment("job-1", Some("s3://bundleX")).unwrap();
        assert_eq!(tracker.count("s3://bundleX"), 1);

        tracker.increment("job-2", Some("s3://bundleX")).unwrap();
        assert_eq!(tracker.count("s3://bundleX"), 2);

        assert_eq!(tracker.count("s3://unknown"), 0);
    }

    #[tokio::test]
    async fn test_empty_package_is_noop() {
        let (tracker, _channel) = tracker_with_channel();

        tracker.increment("job-1", None).unwrap();
        tracker.increment("job-2", Some("")).unwrap();

        let stats = tracker.stats();
        assert_eq!(stats.tracked_packages, 0);
        assert_eq!(stats.tracked_owners, 0);
    }

    #[tokio::test]
    async fn test_decrement_releases_and_publishes_on_zero() {
        let (tracker, channel) = tracker_with_channel();
        let mut rx = channel.subscribe();

        tracker.increment("job-1", Some("s3://bundleX")).unwrap();
        tracker.increment("job-2", Some("s3://bundleX")).unwrap();

        assert_eq!(tracker.decrement("job-1").unwrap(), Vec::<String>::new());
        assert_eq!(tracker.count("s3://bundleX"), 1);

        let released = tracker.decrement("job-2").unwrap();
        assert_eq!(released, vec!["s3://bundleX".to_string()]);
        assert_eq!(tracker.count("s3://bundleX"), 0);

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("GC event not published")
            .unwrap();
        assert_eq!(event.key, "s3://bundleX");
    }

    #[tokio::test]
    async fn test_decrement_unknown_owner_is_noop() {
        let (tracker, _channel) = tracker_with_channel();
        assert_eq!(tracker.decrement("ghost").unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_double_decrement_is_noop() {
        let (tracker, _channel) = tracker_with_channel();

        tracker.increment("job-1", Some("s3://bundleX")).unwrap();
        tracker.increment("job-2", Some("s3://bundleX")).unwrap();

        tracker.decrement("job-1").unwrap();
        // Second teardown of the same owner: index entry is gone, counts of
        // other owners untouched.
        tracker.decrement("job-1").unwrap();
        assert_eq!(tracker.count("s3://bundleX"), 1);
    }

    #[tokio::test]
    async fn test_owner_with_multiple_packages() {
        let (tracker, _channel) = tracker_with_channel();

        tracker.increment("actor-1", Some("s3://a")).unwrap();
        tracker.increment("actor-1", Some("s3://b")).unwrap();

        let mut released = tracker.decrement("actor-1").unwrap();
        released.sort();
        assert_eq!(released, vec!["s3://a".to_string(), "s3://b".to_string()]);
        assert_eq!(tracker.stats().tracked_packages, 0);
    }

    #[tokio::test]
    async fn test_negative_count_raises_invariant_violation() {
        let (tracker, _channel) = tracker_with_channel();

        // Owner index pointing at a package whose count is already 0:
        // reachable only through a missed increment or double decrement
        // elsewhere, planted directly here.
        tracker.force_owner_entry("job-1", vec!["s3://bundleX".to_string()]);

        let err = tracker.decrement("job-1").unwrap_err();
        assert!(matches!(err, TrackerError::InvariantViolation { .. }));
        assert!(tracker.is_halted());
        // No clamped entry was created.
        assert_eq!(tracker.count("s3://bundleX"), 0);
    }

    #[tokio::test]
    async fn test_partial_fault_still_removes_owner_and_publishes() {
        let (tracker, channel) = tracker_with_channel();
        let mut rx = channel.subscribe();

        tracker.increment("job-1", Some("s3://good")).unwrap();
        // Same owner also points at a package with no count entry.
        tracker.force_owner_entry(
            "job-1",
            vec!["s3://missing".to_string(), "s3://good".to_string()],
        );

        let err = tracker.decrement("job-1").unwrap_err();
        assert!(matches!(err, TrackerError::InvariantViolation { .. }));

        // The walk continued past the violation: the healthy package was
        // released and its GC event still fires.
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("GC event not published")
            .unwrap();
        assert_eq!(event.key, "s3://good");

        // Owner index entry removed unconditionally.
        assert_eq!(tracker.stats().tracked_owners, 0);
    }

    #[tokio::test]
    async fn test_halted_tracker_refuses_writes() {
        let (tracker, _channel) = tracker_with_channel();

        tracker.force_owner_entry("job-1", vec!["s3://bundleX".to_string()]);
        tracker.decrement("job-1").unwrap_err();

        assert!(matches!(
            tracker.increment("job-3", Some("s3://other")),
            Err(TrackerError::Halted)
        ));
        assert!(matches!(tracker.decrement("job-3"), Err(TrackerError::Halted)));
        // Reads still work for diagnostics.
        assert_eq!(tracker.count("s3://bundleX"), 0);
    }

    #[test]
    fn test_counts_match_owner_index() {
        // Sync caller driving the tracker through a one-off runtime.
        tokio_test::block_on(async {
            let (tracker, _channel) = tracker_with_channel();
            tracker.increment("a", Some("pkg1")).unwrap();
            tracker.increment("b", Some("pkg1")).unwrap();
            tracker.increment("c", Some("pkg2")).unwrap();

            let stats = tracker.stats();
            assert_eq!(stats.tracked_packages, 2);
            assert_eq!(stats.tracked_owners, 3);
            assert_eq!(stats.total_references, 3);
        });
    }
}

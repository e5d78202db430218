//! Navigation telemetry for observability and user feedback.
//!
//! Lock-free atomic counters recorded by the drill-down controller, with a
//! point-in-time snapshot for display surfaces.
//!
//! ```text
//! DrillDownController ─────► NavMetrics ─────► NavTelemetrySnapshot ─────► Views
//!                           (atomic counters)  (point-in-time copy)        (CLI, etc.)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for drill-down activity.
#[derive(Debug, Default)]
pub struct NavMetrics {
    drills_committed: AtomicU64,
    drills_superseded: AtomicU64,
    drills_empty: AtomicU64,
    go_backs: AtomicU64,
    resets: AtomicU64,
    fetch_failures: AtomicU64,
    invalid_transitions: AtomicU64,
}

impl NavMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// A drill-down transition rendered and committed.
    pub fn drill_committed(&self) {
        self.drills_committed.fetch_add(1, Ordering::Relaxed);
    }

    /// A drill-down attempt discarded because a newer one superseded it.
    pub fn drill_superseded(&self) {
        self.drills_superseded.fetch_add(1, Ordering::Relaxed);
    }

    /// A drill-down attempt that found no boundaries.
    pub fn drill_empty(&self) {
        self.drills_empty.fetch_add(1, Ordering::Relaxed);
    }

    /// A committed go-back transition.
    pub fn went_back(&self) {
        self.go_backs.fetch_add(1, Ordering::Relaxed);
    }

    /// A committed reset to the district root.
    pub fn reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// A boundary or count fetch failed.
    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// An invalid transition was requested (and ignored).
    pub fn invalid_transition(&self) {
        self.invalid_transitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> NavTelemetrySnapshot {
        NavTelemetrySnapshot {
            drills_committed: self.drills_committed.load(Ordering::Relaxed),
            drills_superseded: self.drills_superseded.load(Ordering::Relaxed),
            drills_empty: self.drills_empty.load(Ordering::Relaxed),
            go_backs: self.go_backs.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            invalid_transitions: self.invalid_transitions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`NavMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavTelemetrySnapshot {
    pub drills_committed: u64,
    pub drills_superseded: u64,
    pub drills_empty: u64,
    pub go_backs: u64,
    pub resets: u64,
    pub fetch_failures: u64,
    pub invalid_transitions: u64,
}

impl fmt::Display for NavTelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nav: {} drills ({} superseded, {} empty), {} back, {} resets, {} fetch failures",
            self.drills_committed,
            self.drills_superseded,
            self.drills_empty,
            self.go_backs,
            self.resets,
            self.fetch_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_recorded_events() {
        let metrics = NavMetrics::new();
        metrics.drill_committed();
        metrics.drill_committed();
        metrics.drill_superseded();
        metrics.fetch_failed();
        metrics.went_back();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.drills_committed, 2);
        assert_eq!(snapshot.drills_superseded, 1);
        assert_eq!(snapshot.fetch_failures, 1);
        assert_eq!(snapshot.go_backs, 1);
        assert_eq!(snapshot.resets, 0);
    }

    #[test]
    fn test_display_mentions_core_counters() {
        let metrics = NavMetrics::new();
        metrics.drill_committed();
        let text = metrics.snapshot().to_string();
        assert!(text.contains("1 drills"));
        assert!(text.contains("0 resets"));
    }
}

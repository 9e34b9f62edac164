//! Per-artifact resource budgets.
//!
//! Every artifact decode runs under a [`BudgetTracker`] that bounds the
//! cumulative decompressed bytes, emitted entries, recursion depth, and wall
//! time spent on that artifact. Hitting a cap is normal control flow, not an
//! error: the decoder stops emitting, the matching [`ArtifactStats`] counter
//! is bumped, and the scan continues with the next artifact.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Immutable per-scan caps for artifact work.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactLimits {
    /// Cap on cumulative decompressed bytes per artifact.
    pub max_bytes_per_artifact: u64,
    /// Cap on entries emitted per artifact.
    pub max_entries: u64,
    /// Cap on artifact nesting depth (1 = a plain archive, 2 = one level nested, ...).
    pub max_depth: u32,
    /// Wall-time budget per artifact.
    pub per_artifact_time: Duration,
    /// Absolute deadline shared by all artifact work in the scan.
    pub global_deadline: Option<Instant>,
    /// Worker threads for the scan pool; `None` uses the CPU count.
    pub workers: Option<usize>,
}

impl Default for ArtifactLimits {
    fn default() -> Self {
        Self {
            max_bytes_per_artifact: 100 * 1024 * 1024,
            max_entries: 10_000,
            max_depth: 5,
            per_artifact_time: Duration::from_secs(30),
            global_deadline: None,
            workers: None,
        }
    }
}

/// Why an artifact decode stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// Cumulative decompressed bytes exceeded the cap.
    Bytes,
    /// Entry count exceeded the cap.
    Entries,
    /// Nesting depth exceeded the cap.
    Depth,
    /// The per-artifact budget or global deadline passed.
    Time,
}

impl AbortReason {
    /// Returns the stable lowercase name used in stats and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bytes => "bytes",
            Self::Entries => "entries",
            Self::Depth => "depth",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scan-wide abort counters, shared across artifacts and workers.
///
/// Counters are monotonically non-decreasing within a scan and updated with
/// relaxed atomics - they feed reports, not control flow.
#[derive(Debug, Default)]
pub struct ArtifactStats {
    aborted_by_bytes: AtomicU64,
    aborted_by_entries: AtomicU64,
    aborted_by_depth: AtomicU64,
    aborted_by_time: AtomicU64,
}

impl ArtifactStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `reason`.
    pub fn record(&self, reason: AbortReason) {
        let counter = match reason {
            AbortReason::Bytes => &self.aborted_by_bytes,
            AbortReason::Entries => &self.aborted_by_entries,
            AbortReason::Depth => &self.aborted_by_depth,
            AbortReason::Time => &self.aborted_by_time,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> ArtifactStatsSnapshot {
        ArtifactStatsSnapshot {
            bytes: self.aborted_by_bytes.load(Ordering::Relaxed),
            entries: self.aborted_by_entries.load(Ordering::Relaxed),
            depth: self.aborted_by_depth.load(Ordering::Relaxed),
            time: self.aborted_by_time.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value copy of [`ArtifactStats`], as serialised into reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStatsSnapshot {
    /// Artifacts aborted because decompressed bytes exceeded the cap.
    pub bytes: u64,
    /// Artifacts aborted because the entry count exceeded the cap.
    pub entries: u64,
    /// Artifacts aborted because nesting exceeded the depth cap.
    pub depth: u64,
    /// Artifacts aborted because a time budget or deadline passed.
    pub time: u64,
}

/// Budget state machine for one artifact in progress.
///
/// Decoders call [`BudgetTracker::add_bytes`] / [`BudgetTracker::add_entry`]
/// as they stream and consult [`BudgetTracker::check`] between entries. An
/// `Err(reason)` answer means: record the abort and stop emitting.
#[derive(Debug)]
pub struct BudgetTracker<'a> {
    limits: &'a ArtifactLimits,
    stats: &'a ArtifactStats,
    bytes: u64,
    entries: u64,
    depth: u32,
    started: Instant,
}

impl<'a> BudgetTracker<'a> {
    /// Starts a fresh budget for one outermost artifact (depth 1).
    #[must_use]
    pub fn new(limits: &'a ArtifactLimits, stats: &'a ArtifactStats) -> Self {
        Self {
            limits,
            stats,
            bytes: 0,
            entries: 0,
            depth: 1,
            started: Instant::now(),
        }
    }

    /// Charges `n` decompressed bytes against the artifact budget.
    pub fn add_bytes(&mut self, n: u64) {
        self.bytes = self.bytes.saturating_add(n);
    }

    /// Charges one emitted entry.
    pub fn add_entry(&mut self) {
        self.entries += 1;
    }

    /// Attempts to descend into a nested artifact.
    ///
    /// Returns `false` (and records a depth abort) when descending would
    /// exceed `max_depth`; the caller must then treat the entry as opaque
    /// content instead of recursing.
    pub fn enter(&mut self) -> bool {
        if self.depth + 1 > self.limits.max_depth {
            self.abort(AbortReason::Depth);
            return false;
        }
        self.depth += 1;
        true
    }

    /// Leaves a nested artifact entered with [`BudgetTracker::enter`].
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Returns the current nesting depth.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Answers whether the artifact may continue.
    ///
    /// Exactly-at-cap is still within budget; the first step past a cap
    /// fails. Time is exceeded when either the per-artifact budget or the
    /// shared global deadline has passed.
    pub fn check(&self) -> Result<(), AbortReason> {
        if self.bytes > self.limits.max_bytes_per_artifact {
            return Err(AbortReason::Bytes);
        }
        if self.entries > self.limits.max_entries {
            return Err(AbortReason::Entries);
        }
        if self.started.elapsed() > self.limits.per_artifact_time {
            return Err(AbortReason::Time);
        }
        if let Some(deadline) = self.limits.global_deadline
            && Instant::now() >= deadline
        {
            return Err(AbortReason::Time);
        }
        Ok(())
    }

    /// Records an abort in the shared stats.
    pub fn abort(&self, reason: AbortReason) {
        self.stats.record(reason);
        #[cfg(feature = "tracing")]
        tracing::debug!(reason = reason.as_str(), "artifact aborted");
    }

    /// Remaining bytes before the byte cap trips.
    #[must_use]
    pub fn remaining_bytes(&self) -> u64 {
        self.limits.max_bytes_per_artifact.saturating_sub(self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_bytes: u64, max_entries: u64, max_depth: u32) -> ArtifactLimits {
        ArtifactLimits {
            max_bytes_per_artifact: max_bytes,
            max_entries,
            max_depth,
            ..ArtifactLimits::default()
        }
    }

    #[test]
    fn fresh_tracker_is_within_budget() {
        let limits = ArtifactLimits::default();
        let stats = ArtifactStats::new();
        let tracker = BudgetTracker::new(&limits, &stats);
        assert!(tracker.check().is_ok());
    }

    #[test]
    fn exactly_at_byte_cap_is_allowed() {
        let limits = limits(100, 10, 3);
        let stats = ArtifactStats::new();
        let mut tracker = BudgetTracker::new(&limits, &stats);

        tracker.add_bytes(100);
        assert!(tracker.check().is_ok());

        tracker.add_bytes(1);
        assert_eq!(tracker.check(), Err(AbortReason::Bytes));
    }

    #[test]
    fn exactly_at_entry_cap_is_allowed() {
        let limits = limits(1000, 2, 3);
        let stats = ArtifactStats::new();
        let mut tracker = BudgetTracker::new(&limits, &stats);

        tracker.add_entry();
        tracker.add_entry();
        assert!(tracker.check().is_ok());

        tracker.add_entry();
        assert_eq!(tracker.check(), Err(AbortReason::Entries));
    }

    #[test]
    fn enter_fails_past_max_depth_and_records_abort() {
        let limits = limits(1000, 10, 2);
        let stats = ArtifactStats::new();
        let mut tracker = BudgetTracker::new(&limits, &stats);

        assert!(tracker.enter());
        assert_eq!(tracker.depth(), 2);

        assert!(!tracker.enter());
        assert_eq!(tracker.depth(), 2);
        assert_eq!(stats.snapshot().depth, 1);
    }

    #[test]
    fn leave_restores_depth() {
        let limits = limits(1000, 10, 3);
        let stats = ArtifactStats::new();
        let mut tracker = BudgetTracker::new(&limits, &stats);

        assert!(tracker.enter());
        tracker.leave();
        assert_eq!(tracker.depth(), 1);
    }

    #[test]
    fn elapsed_per_artifact_budget_trips_time() {
        let limits = ArtifactLimits {
            per_artifact_time: Duration::ZERO,
            ..ArtifactLimits::default()
        };
        let stats = ArtifactStats::new();
        let tracker = BudgetTracker::new(&limits, &stats);

        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(tracker.check(), Err(AbortReason::Time));
    }

    #[test]
    fn passed_global_deadline_trips_time() {
        let limits = ArtifactLimits {
            global_deadline: Some(Instant::now()),
            ..ArtifactLimits::default()
        };
        let stats = ArtifactStats::new();
        let tracker = BudgetTracker::new(&limits, &stats);

        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(tracker.check(), Err(AbortReason::Time));
    }

    #[test]
    fn record_increments_exactly_one_counter() {
        let stats = ArtifactStats::new();
        stats.record(AbortReason::Entries);

        let snap = stats.snapshot();
        assert_eq!(snap.entries, 1);
        assert_eq!(snap.bytes, 0);
        assert_eq!(snap.depth, 0);
        assert_eq!(snap.time, 0);
    }

    #[test]
    fn counters_are_monotonic_across_artifacts() {
        let stats = ArtifactStats::new();
        stats.record(AbortReason::Bytes);
        stats.record(AbortReason::Bytes);
        stats.record(AbortReason::Time);

        let snap = stats.snapshot();
        assert_eq!(snap.bytes, 2);
        assert_eq!(snap.time, 1);
    }

    #[test]
    fn snapshot_serialises_with_counter_names() {
        let stats = ArtifactStats::new();
        stats.record(AbortReason::Depth);

        let json = serde_json::to_string(&stats.snapshot()).unwrap();
        assert_eq!(json, r#"{"bytes":0,"entries":0,"depth":1,"time":0}"#);
    }

    #[test]
    fn remaining_bytes_never_underflows() {
        let limits = limits(10, 10, 3);
        let stats = ArtifactStats::new();
        let mut tracker = BudgetTracker::new(&limits, &stats);

        tracker.add_bytes(25);
        assert_eq!(tracker.remaining_bytes(), 0);
    }

    #[test]
    fn abort_reason_names_are_stable() {
        assert_eq!(AbortReason::Bytes.as_str(), "bytes");
        assert_eq!(AbortReason::Entries.as_str(), "entries");
        assert_eq!(AbortReason::Depth.as_str(), "depth");
        assert_eq!(AbortReason::Time.as_str(), "time");
    }
}

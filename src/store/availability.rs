//! Availability Tracker (spec §4.3): per-endpoint success rate and hard-fail
//! streak, used for the emergency failover check and the Selector's
//! `availabilityBias`.

use dashmap::DashMap;

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    success_count: u64,
    total_count: u64,
    hard_fail_streak: u32,
}

/// Cap on the hard-fail streak (spec §3).
pub const MAX_HARD_FAIL_STREAK: u32 = 100;

/// Tracks per-endpoint success rate and hard-failure streak.
///
/// Resetting the streak on success is non-negotiable; a non-hard failure
/// (a probe that completed but reported poor numbers) must never increment
/// the streak. Endpoints are independent keys, so counters live in a
/// `DashMap` rather than one global lock over the whole table.
#[derive(Default)]
pub struct AvailabilityTracker {
    state: DashMap<String, Counters>,
}

impl AvailabilityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome. `success` drives the success-rate counters;
    /// `hard_fail` drives the streak independently — a failed-but-not-hard
    /// outcome still counts against the rate but leaves the streak alone
    /// except that it does not reset it either, only an explicit success
    /// resets the streak.
    pub fn record(&self, endpoint_id: &str, success: bool, hard_fail: bool) {
        let mut counters = self.state.entry(endpoint_id.to_string()).or_default();
        counters.total_count += 1;
        if success {
            counters.success_count += 1;
        }
        if success {
            counters.hard_fail_streak = 0;
        } else if hard_fail {
            counters.hard_fail_streak = (counters.hard_fail_streak + 1).min(MAX_HARD_FAIL_STREAK);
        }
    }

    /// Success rate in `[0, 1]`; `0` if no samples recorded yet.
    #[must_use]
    pub fn rate(&self, endpoint_id: &str) -> f64 {
        match self.state.get(endpoint_id) {
            Some(c) if c.total_count > 0 => c.success_count as f64 / c.total_count as f64,
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn streak(&self, endpoint_id: &str) -> u32 {
        self.state.get(endpoint_id).map_or(0, |c| c.hard_fail_streak)
    }

    #[must_use]
    pub fn total_count(&self, endpoint_id: &str) -> u64 {
        self.state.get(endpoint_id).map_or(0, |c| c.total_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_resets_streak() {
        let tracker = AvailabilityTracker::new();
        tracker.record("a", false, true);
        tracker.record("a", false, true);
        assert_eq!(tracker.streak("a"), 2);
        tracker.record("a", true, false);
        assert_eq!(tracker.streak("a"), 0);
    }

    #[test]
    fn non_hard_failure_does_not_increment_streak() {
        let tracker = AvailabilityTracker::new();
        tracker.record("a", false, true);
        assert_eq!(tracker.streak("a"), 1);
        // A failure that is not a hard failure must not bump the streak.
        tracker.record("a", false, false);
        assert_eq!(tracker.streak("a"), 1);
    }

    #[test]
    fn rate_is_zero_with_no_samples() {
        let tracker = AvailabilityTracker::new();
        assert_eq!(tracker.rate("unseen"), 0.0);
    }

    #[test]
    fn rate_reflects_success_ratio() {
        let tracker = AvailabilityTracker::new();
        tracker.record("a", true, false);
        tracker.record("a", true, false);
        tracker.record("a", false, true);
        assert!((tracker.rate("a") - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn streak_is_capped() {
        let tracker = AvailabilityTracker::new();
        for _ in 0..(MAX_HARD_FAIL_STREAK + 10) {
            tracker.record("a", false, true);
        }
        assert_eq!(tracker.streak("a"), MAX_HARD_FAIL_STREAK);
    }
}
